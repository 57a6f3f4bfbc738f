//! SQL access to the `prompt_specs` table and its version history.
//!
//! Every function takes a plain connection so callers decide the
//! transaction boundary. Pass a `Transaction` (it derefs to `Connection`)
//! to group an upsert with other work.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, ToSql, named_params};
use thoughtlocker::{
    PromptSpec, SearchQuery, SpecRow, UpsertOutcome, VersionAction, VersionRow, format_timestamp,
};

use crate::StoreError;

const SPEC_COLUMNS: &str = "name, description, provider, model, web_search, reasoning_effort,
    context_size, temperature, max_output_tokens, system_instruction, use_cases, parameters,
    tags, version, enabled, aliases, source, checksum, token_limits, notes, created_at, updated_at";

const INSERT_SPEC: &str = "INSERT INTO prompt_specs (
        name, description, provider, model, web_search, reasoning_effort, context_size,
        temperature, max_output_tokens, system_instruction, use_cases, parameters, tags,
        version, enabled, aliases, source, checksum, token_limits, notes, created_at, updated_at
    ) VALUES (
        :name, :description, :provider, :model, :web_search, :reasoning_effort, :context_size,
        :temperature, :max_output_tokens, :system_instruction, :use_cases, :parameters, :tags,
        :version, :enabled, :aliases, :source, :checksum, :token_limits, :notes, :created_at,
        :updated_at
    )";

// No created_at: it is fixed at insert.
const UPDATE_SPEC: &str = "UPDATE prompt_specs SET
        description = :description,
        provider = :provider,
        model = :model,
        web_search = :web_search,
        reasoning_effort = :reasoning_effort,
        context_size = :context_size,
        temperature = :temperature,
        max_output_tokens = :max_output_tokens,
        system_instruction = :system_instruction,
        use_cases = :use_cases,
        parameters = :parameters,
        tags = :tags,
        version = :version,
        enabled = :enabled,
        aliases = :aliases,
        source = :source,
        checksum = :checksum,
        token_limits = :token_limits,
        notes = :notes,
        updated_at = :updated_at
    WHERE name = :name";

const SNAPSHOT_SPEC: &str = "INSERT INTO prompt_spec_versions (
        name, version_seq, action,
        description, provider, model, web_search, reasoning_effort, context_size,
        temperature, max_output_tokens, system_instruction, use_cases, parameters, tags,
        version, enabled, aliases, source, checksum, token_limits, notes,
        created_at, updated_at, occurred_at
    )
    SELECT
        name, :version_seq, :action,
        description, provider, model, web_search, reasoning_effort, context_size,
        temperature, max_output_tokens, system_instruction, use_cases, parameters, tags,
        version, enabled, aliases, source, checksum, token_limits, notes,
        created_at, updated_at, :occurred_at
    FROM prompt_specs
    WHERE name = :name";

/// Insert or update a spec by name and append a version row.
///
/// On update `created_at` is left as stored and `updated_at` always moves
/// forward, even when the clock has not. The version row is copied from
/// the row just written, so it holds exactly what was persisted.
pub fn upsert(conn: &Connection, spec: &PromptSpec) -> Result<UpsertOutcome, StoreError> {
    let now = Utc::now().trunc_subsecs(6);
    let mut row = spec.to_db_params();

    let action = match get_by_name(conn, &spec.name)? {
        None => {
            tracing::info!(name = %spec.name, "inserting new prompt spec");
            let stamp = format_timestamp(&now);
            row.created_at = Some(stamp.clone());
            row.updated_at = Some(stamp);

            let mut params = write_params(&row);
            params.push((":created_at", &row.created_at));
            conn.execute(INSERT_SPEC, params.as_slice())?;
            VersionAction::Insert
        }
        Some(current) => {
            tracing::info!(name = %spec.name, "updating existing prompt spec");
            row.updated_at = Some(format_timestamp(&next_updated_at(current.updated_at, now)));

            conn.execute(UPDATE_SPEC, write_params(&row).as_slice())?;
            VersionAction::Update
        }
    };

    let version_seq = record_version(conn, &spec.name, action, now)?;

    Ok(UpsertOutcome {
        action,
        version_seq,
    })
}

/// Exact-name lookup.
pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<PromptSpec>, StoreError> {
    let spec = conn
        .query_row(
            &format!("SELECT {SPEC_COLUMNS} FROM prompt_specs WHERE name = ?1"),
            [name],
            |row| read_spec_row(row, 0),
        )
        .optional()?;

    Ok(spec.map(PromptSpec::from_row))
}

/// Lookup by primary name or by any alias.
///
/// A missing or malformed alias list never matches. When one row matches
/// by name and another by alias, the name match wins.
pub fn get_by_name_or_alias(
    conn: &Connection,
    key: &str,
) -> Result<Option<PromptSpec>, StoreError> {
    let sql = format!(
        "SELECT {SPEC_COLUMNS} FROM prompt_specs
         WHERE name = ?1
            OR CASE WHEN json_valid(aliases)
                    THEN EXISTS (SELECT 1 FROM json_each(prompt_specs.aliases) WHERE value = ?1)
                    ELSE 0
               END
         ORDER BY CASE WHEN name = ?1 THEN 0 ELSE 1 END, name
         LIMIT 1"
    );

    let spec = conn
        .query_row(&sql, [key], |row| read_spec_row(row, 0))
        .optional()?;

    Ok(spec.map(PromptSpec::from_row))
}

/// All specs ordered by name, optionally only enabled or disabled ones.
pub fn list(conn: &Connection, enabled: Option<bool>) -> Result<Vec<PromptSpec>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SPEC_COLUMNS} FROM prompt_specs
         WHERE ?1 IS NULL OR enabled = ?1
         ORDER BY name"
    ))?;

    let rows = stmt
        .query_map([enabled], |row| read_spec_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(PromptSpec::from_row).collect())
}

/// Filtered search, most recently updated first.
pub fn search(conn: &Connection, query: &SearchQuery) -> Result<Vec<PromptSpec>, StoreError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(text) = query.text_filter() {
        register_fold_case(conn)?;
        let n = bind(&mut params, format!("%{}%", escape_like(&fold_case(text))));
        conditions.push(format!(
            "(fold_case(name) LIKE ?{n} ESCAPE '\\'
              OR fold_case(coalesce(description, '')) LIKE ?{n} ESCAPE '\\'
              OR fold_case(system_instruction) LIKE ?{n} ESCAPE '\\')"
        ));
    }

    if let Some(provider) = query.provider_filter() {
        let n = bind(&mut params, provider.to_owned());
        conditions.push(format!("provider = ?{n}"));
    }

    for tag in &query.tags {
        let n = bind(&mut params, tag.clone());
        conditions.push(format!(
            "CASE WHEN json_valid(tags)
                  THEN EXISTS (SELECT 1 FROM json_each(prompt_specs.tags) WHERE value = ?{n})
                  ELSE 0
             END"
        ));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let limit = bind(&mut params, i64::try_from(query.limit).unwrap_or(i64::MAX));

    let mut stmt = conn.prepare(&format!(
        "SELECT {SPEC_COLUMNS} FROM prompt_specs{where_clause}
         ORDER BY updated_at DESC, name
         LIMIT ?{limit}"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| read_spec_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(PromptSpec::from_row).collect())
}

/// Version history for a name, oldest first.
pub fn history(conn: &Connection, name: &str) -> Result<Vec<VersionRow>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT version_seq, action, occurred_at, {SPEC_COLUMNS}
         FROM prompt_spec_versions
         WHERE name = ?1
         ORDER BY version_seq"
    ))?;

    let rows = stmt
        .query_map([name], |row| {
            let version_seq: i64 = row.get(0)?;
            let action_text: String = row.get(1)?;
            let action = VersionAction::parse(&action_text).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    Type::Text,
                    format!("unknown version action: {action_text}").into(),
                )
            })?;
            let occurred_at: Option<String> = row.get(2)?;

            Ok((version_seq, action, occurred_at, read_spec_row(row, 3)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|(version_seq, action, occurred_at, spec_row)| VersionRow {
            version_seq,
            action,
            occurred_at: occurred_at.as_deref().and_then(thoughtlocker::parse_timestamp),
            spec: PromptSpec::from_row(spec_row),
        })
        .collect())
}

/// Highest recorded `version_seq` for a name, if any.
pub fn latest_version_seq(conn: &Connection, name: &str) -> Result<Option<i64>, StoreError> {
    let seq = conn.query_row(
        "SELECT MAX(version_seq) FROM prompt_spec_versions WHERE name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(seq)
}

fn next_version_seq(conn: &Connection, name: &str) -> Result<i64, StoreError> {
    Ok(latest_version_seq(conn, name)?.unwrap_or(0) + 1)
}

fn record_version(
    conn: &Connection,
    name: &str,
    action: VersionAction,
    occurred_at: DateTime<Utc>,
) -> Result<i64, StoreError> {
    let version_seq = next_version_seq(conn, name)?;
    tracing::info!(name, version_seq, %action, "recording prompt spec version");

    conn.execute(
        SNAPSHOT_SPEC,
        named_params! {
            ":name": name,
            ":version_seq": version_seq,
            ":action": action.as_str(),
            ":occurred_at": format_timestamp(&occurred_at),
        },
    )?;

    Ok(version_seq)
}

/// Timestamps are stored at microsecond precision; keep them strictly
/// increasing per row.
fn next_updated_at(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

/// Named parameters shared by insert and update. `created_at` is added by
/// the insert path only.
fn write_params(row: &SpecRow) -> Vec<(&'static str, &dyn ToSql)> {
    vec![
        (":name", &row.name),
        (":description", &row.description),
        (":provider", &row.provider),
        (":model", &row.model),
        (":web_search", &row.web_search),
        (":reasoning_effort", &row.reasoning_effort),
        (":context_size", &row.context_size),
        (":temperature", &row.temperature),
        (":max_output_tokens", &row.max_output_tokens),
        (":system_instruction", &row.system_instruction),
        (":use_cases", &row.use_cases),
        (":parameters", &row.parameters),
        (":tags", &row.tags),
        (":version", &row.version),
        (":enabled", &row.enabled),
        (":aliases", &row.aliases),
        (":source", &row.source),
        (":checksum", &row.checksum),
        (":token_limits", &row.token_limits),
        (":notes", &row.notes),
        (":updated_at", &row.updated_at),
    ]
}

/// Read the `SPEC_COLUMNS` block starting at column `offset`.
fn read_spec_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<SpecRow> {
    Ok(SpecRow {
        name: row.get(offset)?,
        description: row.get(offset + 1)?,
        provider: row.get(offset + 2)?,
        model: row.get(offset + 3)?,
        web_search: row.get(offset + 4)?,
        reasoning_effort: row.get(offset + 5)?,
        context_size: row.get(offset + 6)?,
        temperature: row.get(offset + 7)?,
        max_output_tokens: row.get(offset + 8)?,
        system_instruction: row.get(offset + 9)?,
        use_cases: row.get(offset + 10)?,
        parameters: row.get(offset + 11)?,
        tags: row.get(offset + 12)?,
        version: row.get(offset + 13)?,
        enabled: row.get(offset + 14)?,
        aliases: row.get(offset + 15)?,
        source: row.get(offset + 16)?,
        checksum: row.get(offset + 17)?,
        token_limits: row.get(offset + 18)?,
        notes: row.get(offset + 19)?,
        created_at: row.get(offset + 20)?,
        updated_at: row.get(offset + 21)?,
    })
}

/// Push a positional parameter and return its 1-based index.
fn bind(params: &mut Vec<Value>, value: impl Into<Value>) -> usize {
    params.push(value.into());
    params.len()
}

fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Install `fold_case(text)`, a Unicode-aware lowercase, on the connection.
fn register_fold_case(conn: &Connection) -> Result<(), StoreError> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| fold_case(&text))),
    )?;
    Ok(())
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
