use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::environment::{Environment, Minion};
use crate::error::EnvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Tabled)]
struct MinionRow {
    #[tabled(rename = "ROLE")]
    role: String,
    #[tabled(rename = "INDEX")]
    index: String,
    #[tabled(rename = "MINION ID")]
    minion_id: String,
    #[tabled(rename = "FQDN")]
    fqdn: String,
    #[tabled(rename = "PUBLIC IPV4")]
    public_ipv4: String,
    #[tabled(rename = "PRIVATE IPV4")]
    private_ipv4: String,
}

impl From<&Minion> for MinionRow {
    fn from(minion: &Minion) -> Self {
        Self {
            role: minion.role.to_string(),
            index: minion.index.clone(),
            minion_id: minion.minion_id.clone(),
            fqdn: minion.fqdn.clone(),
            public_ipv4: minion.addresses.public_ipv4.clone(),
            private_ipv4: minion.addresses.private_ipv4.clone(),
        }
    }
}

pub fn render(environment: &Environment, format: OutputFormat) -> Result<String, EnvError> {
    match format {
        OutputFormat::Json => render_json(environment),
        OutputFormat::Table => Ok(render_table(environment)),
    }
}

/// Pretty formatter that writes non-ASCII characters as `\uXXXX` escapes.
struct AsciiPrettyFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl<'a> AsciiPrettyFormatter<'a> {
    fn with_indent(indent: &'a [u8]) -> Self {
        Self {
            inner: PrettyFormatter::with_indent(indent),
        }
    }
}

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut rest = fragment;
        while let Some(at) = rest.find(|c: char| !c.is_ascii()) {
            writer.write_all(rest[..at].as_bytes())?;

            let c = rest[at..].chars().next().unwrap_or_default();
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }

            rest = &rest[at + c.len_utf8()..];
        }
        writer.write_all(rest.as_bytes())
    }
}

/// Pretty JSON, four-space indent, keys sorted at every level, non-ASCII escaped.
pub fn render_json(environment: &Environment) -> Result<String, EnvError> {
    // NOTE: serde_json::Map is a BTreeMap, so going through Value sorts the keys
    let value = serde_json::to_value(environment).map_err(|e| EnvError::Render(e.to_string()))?;

    let mut buf = Vec::new();
    let formatter = AsciiPrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| EnvError::Render(e.to_string()))?;
    buf.push(b'\n');

    String::from_utf8(buf).map_err(|e| EnvError::Render(e.to_string()))
}

pub fn render_table(environment: &Environment) -> String {
    let rows: Vec<MinionRow> = environment.minions.iter().map(MinionRow::from).collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());

    let mut out = table.to_string();
    out.push('\n');
    out.push_str(&format!(
        "dashboard: {} (internal {})\n",
        environment.dashboard_external_host, environment.dashboard_host
    ));
    if let Some(host) = &environment.kubernetes_external_host {
        out.push_str(&format!("kubernetes: {}\n", host));
    }
    out
}
