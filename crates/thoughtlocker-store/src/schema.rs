use rusqlite_migration::{M, Migrations};

pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "CREATE TABLE prompt_specs (
            name                TEXT PRIMARY KEY,
            description         TEXT,
            provider            TEXT,
            model               TEXT,
            web_search          INTEGER,
            reasoning_effort    TEXT,
            context_size        TEXT,
            temperature         REAL,
            max_output_tokens   INTEGER,
            system_instruction  TEXT NOT NULL DEFAULT '',
            use_cases           TEXT,
            parameters          TEXT,
            tags                TEXT,
            version             TEXT,
            enabled             INTEGER NOT NULL DEFAULT 1,
            aliases             TEXT,
            source              TEXT,
            checksum            TEXT,
            token_limits        TEXT,
            notes               TEXT,
            created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX idx_prompt_specs_provider ON prompt_specs(provider);
        CREATE INDEX idx_prompt_specs_model ON prompt_specs(model);
        CREATE INDEX idx_prompt_specs_enabled ON prompt_specs(enabled);

        CREATE TABLE prompt_spec_versions (
            name                TEXT NOT NULL,
            version_seq         INTEGER NOT NULL,
            action              TEXT NOT NULL CHECK (action IN ('insert', 'update')),
            description         TEXT,
            provider            TEXT,
            model               TEXT,
            web_search          INTEGER,
            reasoning_effort    TEXT,
            context_size        TEXT,
            temperature         REAL,
            max_output_tokens   INTEGER,
            system_instruction  TEXT,
            use_cases           TEXT,
            parameters          TEXT,
            tags                TEXT,
            version             TEXT,
            enabled             INTEGER,
            aliases             TEXT,
            source              TEXT,
            checksum            TEXT,
            token_limits        TEXT,
            notes               TEXT,
            created_at          TEXT,
            updated_at          TEXT,
            occurred_at         TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (name, version_seq)
        );

        CREATE INDEX idx_psv_name ON prompt_spec_versions(name);
        CREATE INDEX idx_psv_name_updated ON prompt_spec_versions(name, updated_at);",
    )])
}
