use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Read,
    Write,
    Schema,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Read(ReadArgs),
    Write(WriteArgs),
    Schema(SchemaArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadOp {
    #[default]
    Find,
    First,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteOp {
    #[default]
    Create,
    Update,
    Destroy,
    Upsert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaOp {
    #[default]
    Create,
    CreateIfMissing,
    Alter,
    Drop,
    DropIfExists,
}

#[derive(Debug, Clone)]
pub struct ReadArgs {
    pub descriptor: PathBuf,
    pub config: Option<PathBuf>,
    pub op: ReadOp,
}

#[derive(Debug, Clone)]
pub struct WriteArgs {
    pub descriptor: PathBuf,
    pub config: Option<PathBuf>,
    pub op: WriteOp,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SchemaArgs {
    pub descriptor: PathBuf,
    pub config: Option<PathBuf>,
    pub op: SchemaOp,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "read" => parse_statement(HelpTopic::Read, it.map(|s| s.as_str())),
        "write" => parse_statement(HelpTopic::Write, it.map(|s| s.as_str())),
        "schema" => parse_statement(HelpTopic::Schema, it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Options shared by the three statement commands.
fn parse_statement<'a>(
    topic: HelpTopic,
    mut it: impl Iterator<Item = &'a str>,
) -> anyhow::Result<Command> {
    let mut descriptor: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut op: Option<&str> = None;
    let mut exclude: Vec<String> = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(topic)),
            "--descriptor" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--descriptor requires a value");
                };
                descriptor = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--descriptor=") => {
                descriptor = Some(PathBuf::from(token.trim_start_matches("--descriptor=")));
            }
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--config=") => {
                config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--op" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--op requires a value");
                };
                op = Some(v);
            }
            _ if token.starts_with("--op=") => {
                op = Some(token.trim_start_matches("--op="));
            }
            "--exclude" if topic == HelpTopic::Write => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--exclude requires a value");
                };
                exclude.extend(split_csv(v));
            }
            _ if topic == HelpTopic::Write && token.starts_with("--exclude=") => {
                exclude.extend(split_csv(token.trim_start_matches("--exclude=")));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let Some(descriptor) = descriptor else {
        anyhow::bail!("--descriptor is required");
    };

    let cmd = match topic {
        HelpTopic::Read => Command::Read(ReadArgs {
            descriptor,
            config,
            op: match op {
                None | Some("find") => ReadOp::Find,
                Some("first") => ReadOp::First,
                Some("count") => ReadOp::Count,
                Some(other) => anyhow::bail!("unknown read operation: {other}"),
            },
        }),
        HelpTopic::Write => {
            let op = match op {
                None | Some("create") => WriteOp::Create,
                Some("update") => WriteOp::Update,
                Some("destroy") => WriteOp::Destroy,
                Some("upsert") => WriteOp::Upsert,
                Some(other) => anyhow::bail!("unknown write operation: {other}"),
            };
            if !exclude.is_empty() && op != WriteOp::Upsert {
                anyhow::bail!("--exclude only applies to --op upsert");
            }
            Command::Write(WriteArgs {
                descriptor,
                config,
                op,
                exclude,
            })
        }
        HelpTopic::Schema => Command::Schema(SchemaArgs {
            descriptor,
            config,
            op: match op {
                None | Some("create") => SchemaOp::Create,
                Some("create-if-missing") => SchemaOp::CreateIfMissing,
                Some("alter") => SchemaOp::Alter,
                Some("drop") => SchemaOp::Drop,
                Some("drop-if-exists") => SchemaOp::DropIfExists,
                Some(other) => anyhow::bail!("unknown schema operation: {other}"),
            },
        }),
        HelpTopic::Root => return Ok(Command::Help(HelpTopic::Root)),
    };

    Ok(cmd)
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
crudsql - compile CRUD descriptors into MySQL statements

USAGE:
  crudsql <COMMAND> --descriptor <FILE> [OPTIONS]

COMMANDS:
  read          SELECT from a read descriptor
  write         INSERT / UPDATE / DELETE / upsert from a write descriptor
  schema        CREATE / ALTER / DROP TABLE from a schema descriptor

Run `crudsql <command> --help` for more."
            );
        }
        HelpTopic::Read => {
            println!(
                "\
USAGE:
  crudsql read --descriptor <FILE> [OPTIONS]

OPTIONS:
  --descriptor <FILE>   JSON read descriptor
  --config <FILE>       Config file path (default: crudsql.toml, if present)
  --op <OP>             find (default), first, count
  -h, --help            Print help"
            );
        }
        HelpTopic::Write => {
            println!(
                "\
USAGE:
  crudsql write --descriptor <FILE> [OPTIONS]

OPTIONS:
  --descriptor <FILE>   JSON write descriptor
  --config <FILE>       Config file path (default: crudsql.toml, if present)
  --op <OP>             create (default), update, destroy, upsert
  --exclude <CSV>       Fields an upsert must not overwrite
  -h, --help            Print help"
            );
        }
        HelpTopic::Schema => {
            println!(
                "\
USAGE:
  crudsql schema --descriptor <FILE> [OPTIONS]

OPTIONS:
  --descriptor <FILE>   JSON schema descriptor
  --config <FILE>       Config file path (default: crudsql.toml, if present)
  --op <OP>             create (default), create-if-missing, alter, drop,
                        drop-if-exists
  -h, --help            Print help"
            );
        }
    }
}
