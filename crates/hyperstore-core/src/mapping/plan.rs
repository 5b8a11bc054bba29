//! Mapping plans: descriptors compiled against a file header

use super::descriptor::MappingDescriptor;
use super::expr::{any_holds, loosely_equal, Condition, KeyExpr, Site, Template};
use super::resolver::{NodeRef, Resolved, Resolver, TypeCatalog};
use crate::error::{Error, Result};
use crate::ids::{EdgeTypeId, HyperedgeTypeId, NodeTypeId};
use crate::reader::Header;
use crate::types::{Category, EdgeType, HyperedgeType, NodeType};
use serde_json::{json, Value};

/// Type the records of a plan are checked against
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Node {
        type_id: NodeTypeId,
    },
    Edge {
        type_id: EdgeTypeId,
        from_type: NodeTypeId,
        to_type: NodeTypeId,
    },
    Hyperedge {
        type_id: HyperedgeTypeId,
        accepted: Vec<NodeTypeId>,
    },
}

impl Target {
    pub fn node(t: &NodeType) -> Self {
        Self::Node { type_id: t.id }
    }

    pub fn edge(t: &EdgeType) -> Self {
        Self::Edge {
            type_id: t.id,
            from_type: t.from_type,
            to_type: t.to_type,
        }
    }

    pub fn hyperedge(t: &HyperedgeType) -> Self {
        Self::Hyperedge {
            type_id: t.id,
            accepted: t.node_types.clone(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Node { .. } => Category::Node,
            Self::Edge { .. } => Category::Edge,
            Self::Hyperedge { .. } => Category::Hyperedge,
        }
    }

    fn type_id(&self) -> i64 {
        match self {
            Self::Node { type_id } => type_id.get(),
            Self::Edge { type_id, .. } => type_id.get(),
            Self::Hyperedge { type_id, .. } => type_id.get(),
        }
    }
}

#[derive(Debug, Clone)]
struct MemberRule {
    category: Category,
    type_id: i64,
    type_name: String,
    key: KeyExpr,
}

#[derive(Debug, Clone)]
enum Base {
    Join(KeyExpr),
    Node,
    Edge { from: KeyExpr, to: KeyExpr },
    Hyperedge { members: Vec<MemberRule> },
}

#[derive(Debug, Clone)]
struct Branch {
    property: Template,
    value: Template,
    templates: Vec<Template>,
}

#[derive(Debug, Clone)]
struct Unpacker {
    column: usize,
    separator: KeyExpr,
}

/// A candidate record produced from one (expanded) row
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Line the row was read from
    pub line: usize,
    /// Materialized payload, not yet validated
    pub payload: Value,
    /// Internal id of the record to update, when the mapping joins
    pub existing: Option<i64>,
    /// Resolved nodes: edge endpoints (from, to) or hyperedge members
    pub links: Vec<NodeRef>,
}

/// A mapping descriptor compiled once per file, evaluated per row
#[derive(Debug, Clone)]
pub struct MappingPlan {
    file: String,
    target: Target,
    key: Option<KeyExpr>,
    base: Base,
    templates: Option<Vec<Template>>,
    branches: Vec<Branch>,
    fallback: Option<Vec<Template>>,
    filter_in: Option<Vec<Condition>>,
    filter_out: Option<Vec<Condition>>,
    unpackers: Vec<Unpacker>,
}

impl MappingPlan {
    /// Compile a descriptor. Every column reference is checked against the
    /// header, so no row is processed with an unresolvable mapping.
    pub fn compile(
        descriptor: &MappingDescriptor,
        header: &Header,
        file: &str,
        target: Target,
        catalog: &dyn TypeCatalog,
    ) -> Result<Self> {
        if descriptor.class != target.category() {
            return Err(Error::Config(format!(
                "Mapping for {} type {} in file {} was given a {} target",
                descriptor.class,
                descriptor.type_name,
                file,
                target.category()
            )));
        }

        let key_expr = |expr: &Value, context: &str| KeyExpr::compile(expr, header, file, context);
        let templates = |def: &Value, context: &str| -> Result<Vec<Template>> {
            match def {
                Value::Array(items) => items
                    .iter()
                    .map(|item| Template::compile(item, header, file, context))
                    .collect(),
                other => Ok(vec![Template::compile(other, header, file, context)?]),
            }
        };

        let key = descriptor
            .key
            .as_ref()
            .map(|k| key_expr(k, "to be used as key"))
            .transpose()?;

        let base = match &descriptor.join {
            Some(join) => Base::Join(key_expr(join, "to be used as join key")?),
            None => match descriptor.class {
                Category::Node => {
                    if key.is_none() {
                        return Err(Error::Config(format!(
                            "Missing \"key\" or \"join\" in node mapping for file {}",
                            file
                        )));
                    }
                    Base::Node
                }
                Category::Edge => {
                    let (Some(from), Some(to)) = (&descriptor.key_f, &descriptor.key_t) else {
                        return Err(Error::Config(format!(
                            "Missing \"key_f\" or \"key_t\" in edge mapping for file {}",
                            file
                        )));
                    };
                    Base::Edge {
                        from: key_expr(from, "to be used as from key")?,
                        to: key_expr(to, "to be used as to key")?,
                    }
                }
                Category::Hyperedge => {
                    let Some(keys) = &descriptor.keys else {
                        return Err(Error::Config(format!(
                            "Missing \"keys\" in hyperedge mapping for file {}",
                            file
                        )));
                    };
                    let members = keys
                        .iter()
                        .enumerate()
                        .map(|(i, member)| {
                            let type_id = catalog
                                .type_id(member.class, &member.type_name)
                                .ok_or_else(|| {
                                    Error::Config(format!(
                                        "Key {} needs unknown {} type {}",
                                        i, member.class, member.type_name
                                    ))
                                })?;
                            Ok(MemberRule {
                                category: member.class,
                                type_id,
                                type_name: member.type_name.clone(),
                                key: key_expr(
                                    &member.key,
                                    "to be used as reference key in hyperedge building",
                                )?,
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Base::Hyperedge { members }
                }
            },
        };

        let templates_def = descriptor
            .mappings
            .as_ref()
            .map(|m| templates(m, "needed for data materialization"))
            .transpose()?;

        let mut branches = Vec::new();
        let mut fallback = None;
        if let Some(switch) = &descriptor.switch {
            for when in &switch.when {
                let context = format!(
                    "needed for data materialization in when {} = {}",
                    when.property, when.value
                );
                branches.push(Branch {
                    property: Template::compile(&when.property, header, file, &context)?,
                    value: Template::compile(&when.value, header, file, &context)?,
                    templates: templates(&when.mappings, &context)?,
                });
            }
            if let Some(default) = &switch.default {
                fallback = Some(templates(
                    &default.mappings,
                    "needed for data materialization in default",
                )?);
            }
        }

        let conditions = |defs: &Option<Vec<serde_json::Map<String, Value>>>, context: &str| {
            defs.as_ref()
                .map(|defs| {
                    defs.iter()
                        .map(|def| Condition::compile(def, header, file, context))
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()
        };
        let filter_in = conditions(&descriptor.filter_in, "needed for data filter in")?;
        let filter_out = conditions(&descriptor.filter_out, "needed for data filter out")?;

        let unpackers = descriptor
            .unpack
            .iter()
            .flatten()
            .map(|unpack| {
                let column = header.position(&unpack.val).ok_or_else(|| Error::MissingColumn {
                    column: unpack.val.clone(),
                    context: "to be unpacked".to_string(),
                    file: file.to_string(),
                })?;
                Ok(Unpacker {
                    column,
                    separator: key_expr(&unpack.split, "needed for data splitting")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            file: file.to_string(),
            target,
            key,
            base,
            templates: templates_def,
            branches,
            fallback,
            filter_in,
            filter_out,
            unpackers,
        })
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Whether rows update existing records rather than insert new ones
    pub fn is_join(&self) -> bool {
        matches!(self.base, Base::Join(_))
    }

    fn site(&self, line: usize) -> Site<'_> {
        Site {
            file: &self.file,
            line,
        }
    }

    /// Cartesian expansion of a row over the unpack rules, in declared order.
    /// Separators are computed from the original row.
    pub fn expand(&self, row: &[String], line: usize) -> Result<Vec<Vec<String>>> {
        let mut rows = vec![row.to_vec()];
        for unpacker in &self.unpackers {
            let separator = unpacker.separator.eval(row, self.site(line))?;
            if separator.is_empty() {
                continue;
            }
            rows = rows
                .into_iter()
                .flat_map(|current| {
                    current[unpacker.column]
                        .split(separator.as_str())
                        .map(|part| {
                            let mut next = current.clone();
                            next[unpacker.column] = part.to_string();
                            next
                        })
                        .collect::<Vec<_>>()
                })
                .collect();
        }
        Ok(rows)
    }

    /// Whether a row passes `filter_in` and `filter_out`
    pub fn accepts(&self, row: &[String], line: usize) -> Result<bool> {
        let site = self.site(line);
        if let Some(filters) = &self.filter_in {
            if !any_holds(filters, row, site)? {
                return Ok(false);
            }
        }
        if let Some(filters) = &self.filter_out {
            if any_holds(filters, row, site)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Build the candidate record of an accepted row
    pub fn transform(&self, row: &[String], line: usize, resolver: &dyn Resolver) -> Result<Record> {
        let site = self.site(line);
        let (mut payload, existing, links) = self.base_record(row, site, resolver)?;

        let selected = match &self.templates {
            Some(templates) => Some(templates),
            None => {
                let mut chosen = None;
                for branch in &self.branches {
                    let property = branch.property.eval(row, site)?;
                    let value = branch.value.eval(row, site)?;
                    if loosely_equal(&property, &value) {
                        chosen = Some(&branch.templates);
                        break;
                    }
                }
                chosen.or(self.fallback.as_ref())
            }
        };

        if let Some(templates) = selected {
            for template in templates {
                payload = template.fill(row, payload, site)?;
            }
        }

        Ok(Record {
            line,
            payload,
            existing,
            links,
        })
    }

    fn unresolved(&self, site: Site<'_>, category: Category, key: &str) -> Error {
        let err = Error::UnresolvedReference {
            file: site.file.to_string(),
            line: site.line,
            category: category.to_string(),
            key: key.to_string(),
        };
        tracing::error!("{}", err);
        err
    }

    fn mismatch(&self, site: Site<'_>, message: String) -> Error {
        let err = Error::TypeMismatch {
            file: site.file.to_string(),
            line: site.line,
            message,
        };
        tracing::error!("{}", err);
        err
    }

    fn base_record(
        &self,
        row: &[String],
        site: Site<'_>,
        resolver: &dyn Resolver,
    ) -> Result<(Value, Option<i64>, Vec<NodeRef>)> {
        let category = self.target.category();
        match &self.base {
            Base::Join(expr) => {
                let payload_id = expr.eval(row, site)?;
                let found = resolver
                    .resolve(category, &payload_id)
                    .ok_or_else(|| self.unresolved(site, category, &payload_id))?;
                if found.type_id() != self.target.type_id() {
                    return Err(self.mismatch(
                        site,
                        format!(
                            "Trying to mix different {} types for {} ({} vs {})",
                            category,
                            payload_id,
                            found.type_id(),
                            self.target.type_id()
                        ),
                    ));
                }
                let internal_id = found.internal_id();
                let (stored_type, payload) = resolver
                    .current(category, internal_id)?
                    .ok_or_else(|| self.unresolved(site, category, &payload_id))?;
                if stored_type != self.target.type_id() {
                    return Err(self.mismatch(
                        site,
                        format!(
                            "Trying to mix different {} types for {} ({} vs {})",
                            category,
                            internal_id,
                            stored_type,
                            self.target.type_id()
                        ),
                    ));
                }
                Ok((payload, Some(internal_id), Vec::new()))
            }
            Base::Node => {
                let payload_id = self.record_key(row, site)?.unwrap_or_default();
                Ok((json!({ "_id": payload_id }), None, Vec::new()))
            }
            Base::Edge { from, to } => {
                let Target::Edge {
                    from_type, to_type, ..
                } = &self.target
                else {
                    return Err(Error::Config("edge mapping without edge target".into()));
                };
                let from = self.endpoint(from.eval(row, site)?, *from_type, "from", site, resolver)?;
                let to = self.endpoint(to.eval(row, site)?, *to_type, "to", site, resolver)?;

                let mut payload = json!({
                    "f_id": from.payload_id,
                    "t_id": to.payload_id,
                });
                if let Some(key) = self.record_key(row, site)? {
                    payload["_id"] = Value::String(key);
                }
                Ok((payload, None, vec![from, to]))
            }
            Base::Hyperedge { members } => {
                let Target::Hyperedge { accepted, .. } = &self.target else {
                    return Err(Error::Config(
                        "hyperedge mapping without hyperedge target".into(),
                    ));
                };
                let mut nodes = Vec::new();
                for rule in members {
                    let payload_id = rule.key.eval(row, site)?;
                    let found = resolver
                        .resolve(rule.category, &payload_id)
                        .ok_or_else(|| self.unresolved(site, rule.category, &payload_id))?;
                    if found.type_id() != rule.type_id {
                        return Err(self.mismatch(
                            site,
                            format!(
                                "{} {} is of the wrong type ({} vs {} [{}])",
                                rule.category,
                                payload_id,
                                found.type_id(),
                                rule.type_id,
                                rule.type_name
                            ),
                        ));
                    }
                    nodes.extend(found.into_member_nodes());
                }

                if let Some(stray) = nodes.iter().find(|n| !accepted.contains(&n.type_id)) {
                    return Err(self.mismatch(
                        site,
                        format!(
                            "Trying to use node {} of unaccepted type {} in hyperedge",
                            stray.payload_id, stray.type_id
                        ),
                    ));
                }

                let mut payload = json!({
                    "node_ids": nodes.iter().map(|n| n.payload_id.clone()).collect::<Vec<_>>(),
                });
                if let Some(key) = self.record_key(row, site)? {
                    payload["_id"] = Value::String(key);
                }
                Ok((payload, None, nodes))
            }
        }
    }

    fn record_key(&self, row: &[String], site: Site<'_>) -> Result<Option<String>> {
        self.key.as_ref().map(|k| k.eval(row, site)).transpose()
    }

    fn endpoint(
        &self,
        payload_id: String,
        expected: NodeTypeId,
        side: &str,
        site: Site<'_>,
        resolver: &dyn Resolver,
    ) -> Result<NodeRef> {
        match resolver.resolve(Category::Node, &payload_id) {
            Some(Resolved::Node(node)) => {
                if node.type_id != expected {
                    return Err(self.mismatch(
                        site,
                        format!(
                            "{} node {} has type {} but the edge type expects {}",
                            side, payload_id, node.type_id, expected
                        ),
                    ));
                }
                Ok(node)
            }
            _ => Err(self.unresolved(site, Category::Node, &payload_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{EdgeId, HyperedgeId, NodeId};
    use crate::mapping::descriptor::{
        DefaultDescriptor, MemberDescriptor, SwitchDescriptor, UnpackDescriptor, WhenDescriptor,
    };
    use crate::mapping::resolver::{EdgeRef, HyperedgeRef};
    use std::collections::HashMap;

    const GENE: NodeTypeId = NodeTypeId(1);
    const DRUG: NodeTypeId = NodeTypeId(2);

    #[derive(Default)]
    struct Fixture {
        nodes: HashMap<String, NodeRef>,
        edges: HashMap<String, EdgeRef>,
        hyperedges: HashMap<String, HyperedgeRef>,
        payloads: HashMap<i64, (i64, Value)>,
    }

    impl Fixture {
        fn with_node(mut self, id: i64, type_id: NodeTypeId, payload_id: &str) -> Self {
            self.nodes.insert(
                payload_id.to_string(),
                NodeRef {
                    id: NodeId(id),
                    type_id,
                    payload_id: payload_id.to_string(),
                },
            );
            self.payloads
                .insert(id, (type_id.get(), json!({"_id": payload_id, "name": payload_id})));
            self
        }

        fn node(&self, payload_id: &str) -> NodeRef {
            self.nodes[payload_id].clone()
        }
    }

    impl Resolver for Fixture {
        fn resolve(&self, category: Category, payload_id: &str) -> Option<Resolved> {
            match category {
                Category::Node => self.nodes.get(payload_id).cloned().map(Resolved::Node),
                Category::Edge => self.edges.get(payload_id).cloned().map(Resolved::Edge),
                Category::Hyperedge => self
                    .hyperedges
                    .get(payload_id)
                    .cloned()
                    .map(Resolved::Hyperedge),
            }
        }

        fn current(&self, _category: Category, internal_id: i64) -> Result<Option<(i64, Value)>> {
            Ok(self.payloads.get(&internal_id).cloned())
        }
    }

    struct Catalog;

    impl TypeCatalog for Catalog {
        fn type_id(&self, category: Category, name: &str) -> Option<i64> {
            match (category, name) {
                (Category::Node, "gene") => Some(1),
                (Category::Node, "drug") => Some(2),
                (Category::Edge, "targets") => Some(10),
                (Category::Hyperedge, "complex") => Some(20),
                _ => None,
            }
        }
    }

    fn header(cols: &[&str]) -> Header {
        Header::new(cols.iter().map(|c| c.to_string()).collect())
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn node_target() -> Target {
        Target::Node { type_id: GENE }
    }

    #[test]
    fn test_node_insert_with_mappings() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.key = Some(json!("id"));
        d.mappings = Some(json!([{"\"name\"": "symbol"}, {"\"score\"": "score::number"}]));
        let plan =
            MappingPlan::compile(&d, &header(&["id", "symbol", "score"]), "g.tsv", node_target(), &Catalog)
                .unwrap();

        let record = plan
            .transform(&row(&["G1", "BRCA1", "2.5"]), 2, &Fixture::default())
            .unwrap();
        assert_eq!(record.payload, json!({"_id": "G1", "name": "BRCA1", "score": 2.5}));
        assert_eq!(record.existing, None);
        assert!(record.links.is_empty());
    }

    #[test]
    fn test_unknown_column_is_rejected_at_compile_time() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.key = Some(json!("id"));
        d.mappings = Some(json!({"\"name\"": "symbol"}));
        let err = MappingPlan::compile(&d, &header(&["id"]), "g.tsv", node_target(), &Catalog).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_unpack_expands_cartesian_product() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.key = Some(json!("id"));
        d.unpack = Some(vec![
            UnpackDescriptor {
                val: "id".into(),
                split: json!("\",\""),
            },
            UnpackDescriptor {
                val: "alias".into(),
                split: json!("sep"),
            },
        ]);
        let plan = MappingPlan::compile(
            &d,
            &header(&["id", "alias", "sep"]),
            "g.tsv",
            node_target(),
            &Catalog,
        )
        .unwrap();

        let single = plan.expand(&row(&["a,b,c", "x", "|"]), 2).unwrap();
        assert_eq!(single.len(), 3);
        assert_eq!(single[0], row(&["a", "x", "|"]));
        assert_eq!(single[1], row(&["b", "x", "|"]));
        assert_eq!(single[2], row(&["c", "x", "|"]));

        let product = plan.expand(&row(&["a,b", "x|y", "|"]), 3).unwrap();
        assert_eq!(product.len(), 4);
        assert_eq!(product[1], row(&["a", "y", "|"]));
        assert_eq!(product[2], row(&["b", "x", "|"]));
    }

    #[test]
    fn test_filters() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.key = Some(json!("id"));
        d.filter_in = Some(vec![json!({"col": "\"3\""}).as_object().unwrap().clone()]);
        d.filter_out = Some(vec![json!({"id": "\"skip\""}).as_object().unwrap().clone()]);
        let plan =
            MappingPlan::compile(&d, &header(&["id", "col"]), "g.tsv", node_target(), &Catalog).unwrap();

        assert!(plan.accepts(&row(&["a", "3"]), 2).unwrap());
        assert!(!plan.accepts(&row(&["b", "4"]), 3).unwrap());
        assert!(!plan.accepts(&row(&["skip", "3"]), 4).unwrap());
    }

    #[test]
    fn test_switch_takes_first_matching_branch() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.key = Some(json!("id"));
        d.switch = Some(SwitchDescriptor {
            when: vec![
                WhenDescriptor {
                    property: json!("kind"),
                    value: json!("\"protein\""),
                    mappings: json!({"\"coding\"": true}),
                },
                WhenDescriptor {
                    property: json!("kind"),
                    value: json!("\"protein\""),
                    mappings: json!({"\"second\"": true}),
                },
            ],
            default: Some(DefaultDescriptor {
                mappings: json!({"\"coding\"": false}),
            }),
        });
        let plan =
            MappingPlan::compile(&d, &header(&["id", "kind"]), "g.tsv", node_target(), &Catalog).unwrap();
        let fixture = Fixture::default();

        let coding = plan.transform(&row(&["G1", "protein"]), 2, &fixture).unwrap();
        assert_eq!(coding.payload, json!({"_id": "G1", "coding": true}));

        let other = plan.transform(&row(&["G2", "rna"]), 3, &fixture).unwrap();
        assert_eq!(other.payload, json!({"_id": "G2", "coding": false}));
    }

    #[test]
    fn test_node_join_merges_into_current_payload() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.join = Some(json!("id"));
        d.mappings = Some(json!({"\"alias\"": "alias"}));
        let plan =
            MappingPlan::compile(&d, &header(&["id", "alias"]), "g.tsv", node_target(), &Catalog).unwrap();
        let fixture = Fixture::default().with_node(5, GENE, "G1");

        let record = plan.transform(&row(&["G1", "breast cancer 1"]), 2, &fixture).unwrap();
        assert_eq!(record.existing, Some(5));
        assert_eq!(
            record.payload,
            json!({"_id": "G1", "name": "G1", "alias": "breast cancer 1"})
        );

        let err = plan.transform(&row(&["G9", "x"]), 3, &fixture).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { line: 3, .. }));
    }

    #[test]
    fn test_node_join_rejects_other_type() {
        let mut d = MappingDescriptor::new(Category::Node, "gene");
        d.join = Some(json!("id"));
        let plan = MappingPlan::compile(&d, &header(&["id"]), "g.tsv", node_target(), &Catalog).unwrap();
        let fixture = Fixture::default().with_node(5, DRUG, "D1");
        let err = plan.transform(&row(&["D1"]), 2, &fixture).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    fn edge_target() -> Target {
        Target::Edge {
            type_id: EdgeTypeId(10),
            from_type: DRUG,
            to_type: GENE,
        }
    }

    #[test]
    fn test_edge_resolves_and_type_checks_endpoints() {
        let mut d = MappingDescriptor::new(Category::Edge, "targets");
        d.key_f = Some(json!("drug"));
        d.key_t = Some(json!("gene"));
        d.key = Some(json!(["drug", "\"->\"", "gene"]));
        let plan =
            MappingPlan::compile(&d, &header(&["drug", "gene"]), "t.tsv", edge_target(), &Catalog).unwrap();
        let fixture = Fixture::default()
            .with_node(1, DRUG, "D1")
            .with_node(2, GENE, "G1")
            .with_node(3, GENE, "G2");

        let record = plan.transform(&row(&["D1", "G1"]), 2, &fixture).unwrap();
        assert_eq!(record.payload, json!({"f_id": "D1", "t_id": "G1", "_id": "D1->G1"}));
        assert_eq!(record.links, vec![fixture.node("D1"), fixture.node("G1")]);

        let err = plan.transform(&row(&["G2", "G1"]), 3, &fixture).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { line: 3, .. }));

        let err = plan.transform(&row(&["D1", "G404"]), 4, &fixture).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
    }

    #[test]
    fn test_hyperedge_members_expand_edges() {
        let mut fixture = Fixture::default()
            .with_node(1, DRUG, "D1")
            .with_node(2, GENE, "G1")
            .with_node(3, GENE, "G2");
        let (d1, g1, g2) = (fixture.node("D1"), fixture.node("G1"), fixture.node("G2"));
        fixture.edges.insert(
            "D1->G1".into(),
            EdgeRef {
                id: EdgeId(7),
                type_id: EdgeTypeId(10),
                from: d1,
                to: g1.clone(),
            },
        );
        fixture.hyperedges.insert(
            "H0".into(),
            HyperedgeRef {
                id: HyperedgeId(9),
                type_id: HyperedgeTypeId(20),
                members: vec![g2, g1],
            },
        );

        let mut d = MappingDescriptor::new(Category::Hyperedge, "complex");
        d.key = Some(json!("id"));
        d.keys = Some(vec![
            MemberDescriptor {
                class: Category::Edge,
                type_name: "targets".into(),
                key: json!("edge"),
            },
            MemberDescriptor {
                class: Category::Node,
                type_name: "gene".into(),
                key: json!("gene"),
            },
            MemberDescriptor {
                class: Category::Hyperedge,
                type_name: "complex".into(),
                key: json!("parent"),
            },
        ]);
        let target = Target::Hyperedge {
            type_id: HyperedgeTypeId(20),
            accepted: vec![GENE, DRUG],
        };
        let plan = MappingPlan::compile(
            &d,
            &header(&["id", "edge", "gene", "parent"]),
            "h.tsv",
            target,
            &Catalog,
        )
        .unwrap();

        let record = plan
            .transform(&row(&["H1", "D1->G1", "G2", "H0"]), 2, &fixture)
            .unwrap();
        assert_eq!(
            record.payload,
            json!({"node_ids": ["D1", "G1", "G2", "G2", "G1"], "_id": "H1"})
        );
        assert_eq!(record.links.len(), 5);

        let narrow = Target::Hyperedge {
            type_id: HyperedgeTypeId(20),
            accepted: vec![GENE],
        };
        let plan = MappingPlan::compile(
            &d,
            &header(&["id", "edge", "gene", "parent"]),
            "h.tsv",
            narrow,
            &Catalog,
        )
        .unwrap();
        let err = plan
            .transform(&row(&["H1", "D1->G1", "G2", "H0"]), 2, &fixture)
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_hyperedge_member_of_unknown_type() {
        let mut d = MappingDescriptor::new(Category::Hyperedge, "complex");
        d.keys = Some(vec![MemberDescriptor {
            class: Category::Node,
            type_name: "protein".into(),
            key: json!("id"),
        }]);
        let target = Target::Hyperedge {
            type_id: HyperedgeTypeId(20),
            accepted: vec![GENE],
        };
        let err = MappingPlan::compile(&d, &header(&["id"]), "h.tsv", target, &Catalog).unwrap_err();
        assert!(err.to_string().contains("unknown node type protein"));
    }
}
