use crate::cli::{ReadArgs, ReadOp, SchemaArgs, SchemaOp, WriteArgs, WriteOp};
use crate::config::ConfigFile;
use crudsql::{
    MySqlEscaper, ReadDescriptor, SchemaDescriptor, SqlCompiler, StatementKind, WriteDescriptor,
};
use serde::de::DeserializeOwned;
use std::path::Path;

fn load_descriptor<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read descriptor {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid descriptor {}: {e}", path.display()))
}

fn compiler(config: Option<&Path>) -> anyhow::Result<SqlCompiler<MySqlEscaper>> {
    let file = ConfigFile::resolve(config)?;
    tracing::debug!(config = ?file.compiler, "compiler configured");
    Ok(SqlCompiler::with_config(MySqlEscaper, file.compiler))
}

fn finish(sql: crudsql::SqlResult<String>, path: &Path) -> anyhow::Result<String> {
    let sql = sql.map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
    tracing::info!(kind = ?StatementKind::from_sql(&sql), "compiled");
    Ok(sql)
}

pub fn read(args: &ReadArgs) -> anyhow::Result<String> {
    let desc: ReadDescriptor = load_descriptor(&args.descriptor)?;
    let compiler = compiler(args.config.as_deref())?;
    let builder = desc.into_builder(compiler.context());

    let sql = match args.op {
        ReadOp::Find => builder.find(),
        ReadOp::First => builder.first(),
        ReadOp::Count => builder.count(),
    };
    finish(sql, &args.descriptor)
}

pub fn write(args: &WriteArgs) -> anyhow::Result<String> {
    let mut desc: WriteDescriptor = load_descriptor(&args.descriptor)?;
    let compiler = compiler(args.config.as_deref())?;
    let mut exclude = std::mem::take(&mut desc.exclude);
    exclude.extend(args.exclude.iter().cloned());
    let builder = desc.into_builder(compiler.context());

    let sql = match args.op {
        WriteOp::Create => builder.create(),
        WriteOp::Update => builder.update(),
        WriteOp::Destroy => builder.destroy(),
        WriteOp::Upsert => builder.upsert(exclude),
    };
    finish(sql, &args.descriptor)
}

pub fn schema(args: &SchemaArgs) -> anyhow::Result<String> {
    let desc: SchemaDescriptor = load_descriptor(&args.descriptor)?;
    let compiler = compiler(args.config.as_deref())?;
    let builder = desc.into_builder(compiler.context());

    let sql = match args.op {
        SchemaOp::Create => builder.create(),
        SchemaOp::CreateIfMissing => builder.create_if_missing(),
        SchemaOp::Alter => builder.alter(),
        SchemaOp::Drop => builder.drop(),
        SchemaOp::DropIfExists => builder.drop_if_exists(),
    };
    finish(sql, &args.descriptor)
}
