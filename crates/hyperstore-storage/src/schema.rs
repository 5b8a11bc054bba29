//! Relational layout of a store

/// Tables of schema version 1
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS json_schemas (
    schema_id TEXT PRIMARY KEY,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS node_type (
    nt_id INTEGER PRIMARY KEY AUTOINCREMENT,
    nt_name TEXT NOT NULL UNIQUE,
    nt_desc TEXT,
    node_schema_id TEXT NOT NULL REFERENCES json_schemas(schema_id),
    payload TEXT
);

CREATE TABLE IF NOT EXISTS edge_type (
    et_id INTEGER PRIMARY KEY AUTOINCREMENT,
    et_name TEXT NOT NULL UNIQUE,
    et_desc TEXT,
    a_nt_id INTEGER NOT NULL REFERENCES node_type(nt_id),
    b_nt_id INTEGER NOT NULL REFERENCES node_type(nt_id),
    is_directed INTEGER NOT NULL DEFAULT 0,
    is_symmetric INTEGER NOT NULL DEFAULT 0,
    edge_schema_id TEXT NOT NULL REFERENCES json_schemas(schema_id),
    weight_name TEXT,
    weight_desc TEXT,
    payload TEXT
);

CREATE TABLE IF NOT EXISTS hyperedge_type (
    het_id INTEGER PRIMARY KEY AUTOINCREMENT,
    het_name TEXT NOT NULL UNIQUE,
    het_desc TEXT,
    is_tuple INTEGER NOT NULL DEFAULT 0,
    is_directed INTEGER NOT NULL DEFAULT 0,
    is_symmetric INTEGER NOT NULL DEFAULT 0,
    hyperedge_schema_id TEXT NOT NULL REFERENCES json_schemas(schema_id),
    weight_name TEXT,
    weight_desc TEXT,
    payload TEXT
);

-- Accepted node types, in declaration order
CREATE TABLE IF NOT EXISTS hyperedge_type_node_type (
    het_nt_id INTEGER PRIMARY KEY AUTOINCREMENT,
    het_id INTEGER NOT NULL REFERENCES hyperedge_type(het_id) ON DELETE CASCADE,
    nt_id INTEGER NOT NULL REFERENCES node_type(nt_id),
    UNIQUE (het_id, nt_id)
);

CREATE TABLE IF NOT EXISTS hypergraph (
    h_id INTEGER PRIMARY KEY AUTOINCREMENT,
    h_payload_id TEXT NOT NULL UNIQUE,
    stored_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS node (
    n_id INTEGER PRIMARY KEY AUTOINCREMENT,
    h_id INTEGER NOT NULL REFERENCES hypergraph(h_id) ON DELETE CASCADE,
    nt_id INTEGER NOT NULL REFERENCES node_type(nt_id),
    n_payload_id TEXT NOT NULL,
    n_payload_name TEXT,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS node_payload_id ON node(h_id, n_payload_id);
CREATE INDEX IF NOT EXISTS node_type_idx ON node(h_id, nt_id);
CREATE INDEX IF NOT EXISTS node_name ON node(h_id, n_payload_name);

CREATE TABLE IF NOT EXISTS edge (
    e_id INTEGER PRIMARY KEY AUTOINCREMENT,
    h_id INTEGER NOT NULL REFERENCES hypergraph(h_id) ON DELETE CASCADE,
    et_id INTEGER NOT NULL REFERENCES edge_type(et_id),
    from_id INTEGER NOT NULL REFERENCES node(n_id),
    to_id INTEGER NOT NULL REFERENCES node(n_id),
    e_payload_id TEXT,
    e_payload_f_id TEXT NOT NULL,
    e_payload_t_id TEXT NOT NULL,
    e_payload_weight REAL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS edge_from ON edge(from_id, et_id);
CREATE INDEX IF NOT EXISTS edge_to ON edge(to_id, et_id);
CREATE INDEX IF NOT EXISTS edge_type_idx ON edge(h_id, et_id);
CREATE INDEX IF NOT EXISTS edge_payload_id ON edge(h_id, e_payload_id);

CREATE TABLE IF NOT EXISTS hyperedge (
    he_id INTEGER PRIMARY KEY AUTOINCREMENT,
    h_id INTEGER NOT NULL REFERENCES hypergraph(h_id) ON DELETE CASCADE,
    het_id INTEGER NOT NULL REFERENCES hyperedge_type(het_id),
    he_payload_id TEXT,
    he_payload_weight REAL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS hyperedge_type_idx ON hyperedge(h_id, het_id);
CREATE INDEX IF NOT EXISTS hyperedge_payload_id ON hyperedge(h_id, he_payload_id);

-- Membership, insertion order is member order
CREATE TABLE IF NOT EXISTS hyperedge_node (
    he_n_id INTEGER PRIMARY KEY AUTOINCREMENT,
    he_id INTEGER NOT NULL REFERENCES hyperedge(he_id) ON DELETE CASCADE,
    n_id INTEGER NOT NULL REFERENCES node(n_id)
);

CREATE INDEX IF NOT EXISTS hyperedge_node_he ON hyperedge_node(he_id);
CREATE INDEX IF NOT EXISTS hyperedge_node_n ON hyperedge_node(n_id);
"#;
