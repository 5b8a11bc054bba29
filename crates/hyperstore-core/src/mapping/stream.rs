//! Lazy record stream over one tabular file

use super::descriptor::MappingDescriptor;
use super::plan::{MappingPlan, Record, Target};
use super::resolver::{Resolver, TypeCatalog};
use crate::error::Result;
use crate::reader::TabularReader;
use std::collections::VecDeque;
use std::path::Path;

/// Reads rows, expands, filters and transforms them on demand.
///
/// The resolver is passed on every call so lookups always see the records
/// inserted so far. Once an error is returned the stream yields nothing more.
#[derive(Debug)]
pub struct RecordStream {
    reader: TabularReader,
    plan: MappingPlan,
    pending: VecDeque<Vec<String>>,
    pending_line: usize,
    filtered_out: usize,
    finished: bool,
}

impl RecordStream {
    /// Compile `descriptor` against the reader's header
    pub fn new(
        reader: TabularReader,
        descriptor: &MappingDescriptor,
        target: Target,
        catalog: &dyn TypeCatalog,
    ) -> Result<Self> {
        let plan = MappingPlan::compile(descriptor, reader.header(), reader.name(), target, catalog)?;
        Ok(Self {
            reader,
            plan,
            pending: VecDeque::new(),
            pending_line: 0,
            filtered_out: 0,
            finished: false,
        })
    }

    pub fn open(
        path: impl AsRef<Path>,
        descriptor: &MappingDescriptor,
        target: Target,
        catalog: &dyn TypeCatalog,
    ) -> Result<Self> {
        Self::new(TabularReader::open(path)?, descriptor, target, catalog)
    }

    pub fn plan(&self) -> &MappingPlan {
        &self.plan
    }

    /// Rows (after unpacking) rejected by the filters so far
    pub fn filtered_out(&self) -> usize {
        self.filtered_out
    }

    /// Line of the row currently being processed
    pub fn line(&self) -> usize {
        self.pending_line
    }

    pub fn next_record(&mut self, resolver: &dyn Resolver) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }
        let next = self.advance(resolver);
        if !matches!(next, Ok(Some(_))) {
            self.finished = true;
        }
        next
    }

    fn advance(&mut self, resolver: &dyn Resolver) -> Result<Option<Record>> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                if !self.plan.accepts(&row, self.pending_line)? {
                    self.filtered_out += 1;
                    continue;
                }
                return self
                    .plan
                    .transform(&row, self.pending_line, resolver)
                    .map(Some);
            }

            let Some(row) = self.reader.next_row()? else {
                return Ok(None);
            };
            self.pending_line = row.line;
            self.pending = self.plan.expand(&row.values, row.line)?.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ids::{NodeId, NodeTypeId};
    use crate::mapping::resolver::{NodeRef, Resolved};
    use crate::types::Category;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;

    struct Catalog;

    impl TypeCatalog for Catalog {
        fn type_id(&self, _category: Category, _name: &str) -> Option<i64> {
            Some(1)
        }
    }

    /// Records every node as soon as it is produced
    #[derive(Default)]
    struct Memory {
        nodes: RefCell<HashMap<String, NodeRef>>,
    }

    impl Memory {
        fn insert(&self, payload_id: &str) {
            let mut nodes = self.nodes.borrow_mut();
            let id = nodes.len() as i64 + 1;
            nodes.insert(
                payload_id.to_string(),
                NodeRef {
                    id: NodeId(id),
                    type_id: NodeTypeId(1),
                    payload_id: payload_id.to_string(),
                },
            );
        }
    }

    impl Resolver for Memory {
        fn resolve(&self, category: Category, payload_id: &str) -> Option<Resolved> {
            match category {
                Category::Node => self.nodes.borrow().get(payload_id).cloned().map(Resolved::Node),
                _ => None,
            }
        }

        fn current(&self, _category: Category, _internal_id: i64) -> Result<Option<(i64, Value)>> {
            Ok(Some((1, json!({}))))
        }
    }

    fn stream(text: &'static str, descriptor: &MappingDescriptor) -> Result<RecordStream> {
        let reader = TabularReader::from_reader(Cursor::new(text.as_bytes()), "genes.tsv")?;
        RecordStream::new(
            reader,
            descriptor,
            Target::Node {
                type_id: NodeTypeId(1),
            },
            &Catalog,
        )
    }

    fn drain(stream: &mut RecordStream, resolver: &dyn Resolver) -> Vec<Record> {
        let mut out = Vec::new();
        while let Some(record) = stream.next_record(resolver).unwrap() {
            out.push(record);
        }
        out
    }

    #[test]
    fn test_unpack_yields_one_record_per_part() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.key = Some(json!("id"));
        d.unpack = Some(vec![crate::mapping::descriptor::UnpackDescriptor {
            val: "id".into(),
            split: json!("\",\""),
        }]);
        let mut s = stream("id\tname\na,b,c\tx\n", &d).unwrap();
        let records = drain(&mut s, &Memory::default());
        let ids: Vec<_> = records.iter().map(|r| r.payload["_id"].clone()).collect();
        assert_eq!(ids, vec![json!("a"), json!("b"), json!("c")]);
        assert!(records.iter().all(|r| r.line == 2));
    }

    #[test]
    fn test_filter_counts_rejected_rows() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.key = Some(json!("id"));
        d.filter_in = Some(vec![json!({"col": 3}).as_object().unwrap().clone()]);
        let mut s = stream("id\tcol\nr3\t3\nr4\t4\n", &d).unwrap();
        let records = drain(&mut s, &Memory::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload["_id"], json!("r3"));
        assert_eq!(s.filtered_out(), 1);
    }

    #[test]
    fn test_resolver_sees_records_inserted_between_rows() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.join = Some(json!("id"));
        let memory = Memory::default();
        memory.insert("G1");
        let mut s = stream("id\nG1\nG2\n", &d).unwrap();

        assert_eq!(s.next_record(&memory).unwrap().unwrap().existing, Some(1));
        memory.insert("G2");
        assert_eq!(s.next_record(&memory).unwrap().unwrap().existing, Some(2));
        assert!(s.next_record(&memory).unwrap().is_none());
    }

    #[test]
    fn test_stream_is_fused_after_error() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.key = Some(json!("id"));
        let mut s = stream("id\tv\nG1\t1\nG2\nG3\t3\n", &d).unwrap();
        let memory = Memory::default();

        assert!(s.next_record(&memory).unwrap().is_some());
        let err = s.next_record(&memory).unwrap_err();
        assert!(matches!(err, Error::ColumnCount { line: 3, .. }));
        assert!(s.next_record(&memory).unwrap().is_none());
    }
}
