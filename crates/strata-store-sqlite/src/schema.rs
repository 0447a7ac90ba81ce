//! SQL schema for a Strata SQLite store.
//!
//! The catalogue never writes; this DDL exists so a fresh database (or an
//! in-memory test store) has the tables the read paths expect. Existing
//! tables are left untouched.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS spatial_models (
    id               INTEGER PRIMARY KEY,
    geographic_name  TEXT,
    description      TEXT,
    coord_x          REAL,
    coord_y          REAL,
    basin            TEXT,
    orientation      TEXT,
    url              TEXT
);

CREATE TABLE IF NOT EXISTS rock_samples (
    code         TEXT PRIMARY KEY,
    name         TEXT,
    basin        TEXT,
    source       TEXT,
    stratum      TEXT,
    lithology    TEXT,
    description  TEXT,
    location     TEXT,
    sampled_at   TEXT
);

CREATE TABLE IF NOT EXISTS thin_section_reports (
    code               TEXT PRIMARY KEY,
    rock_class         TEXT,
    composition        TEXT,
    grain_size         TEXT,
    special_substance  TEXT,
    special_structure  TEXT,
    color              TEXT,
    photo              TEXT,
    roundness          TEXT,
    porosity           TEXT,
    sorting            TEXT,
    matrix             TEXT,
    fragment_content   TEXT,
    feldspar_content   TEXT,
    quartz_content     TEXT
);

-- Codes may have been imported with a space between every character.
CREATE TABLE IF NOT EXISTS xrf_results (
    code        TEXT NOT NULL,
    stratum     TEXT,
    field_name  TEXT,
    si          REAL,
    mg          REAL,
    al          REAL,
    k           REAL,
    ca          REAL,
    fe          REAL,
    ba          REAL
);

CREATE TABLE IF NOT EXISTS rock_specimens (
    id                 INTEGER PRIMARY KEY,
    series             TEXT,
    group_section      TEXT,
    base_name          TEXT,
    color              TEXT,
    main_composition   TEXT,
    grain_size         TEXT,
    special_structure  TEXT,
    special_mineral    TEXT,
    rock_category      TEXT
);

-- association_key holds the owner's natural key as text:
-- geographic_name, sample code, or specimen id depending on association_type.
CREATE TABLE IF NOT EXISTS media_files (
    id                INTEGER PRIMARY KEY,
    association_type  TEXT NOT NULL,
    association_key   TEXT NOT NULL,
    media_kind        TEXT,
    file_name         TEXT,
    description       TEXT,
    payload           BLOB,
    url               TEXT
);

CREATE TABLE IF NOT EXISTS relations (
    id             INTEGER PRIMARY KEY,
    relation_type  TEXT,
    entity_ref_1   TEXT,
    entity_ref_2   TEXT,
    degree         REAL,
    file           TEXT
);

CREATE INDEX IF NOT EXISTS xrf_code_idx        ON xrf_results(code);
CREATE INDEX IF NOT EXISTS media_owner_idx     ON media_files(association_type, association_key);
CREATE INDEX IF NOT EXISTS relations_ref_1_idx ON relations(entity_ref_1);
CREATE INDEX IF NOT EXISTS relations_ref_2_idx ON relations(entity_ref_2);

PRAGMA user_version = 1;
";
