//! Structural model of generated Go source.
//!
//! A small parser for the shape of file this tool emits: a package clause,
//! imports, and top-level declarations. Struct and interface types are parsed
//! member by member; every other declaration is kept as verbatim text together
//! with enough of its header (kind, name, receiver) to be looked up.
//!
//! Rendering is deterministic and close to gofmt (tab indentation, aligned
//! struct columns, grouped imports), so `render(parse(render(f)))` is stable
//! and a run that changes nothing writes the same bytes.

use thiserror::Error;

mod tokens;

use tokens::{BodyKind, Token};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoSourceError {
    #[error("line {line}: unexpected '{found}'")]
    UnbalancedDelimiter { line: usize, found: char },

    #[error("line {line}: declaration is never closed")]
    UnclosedDeclaration { line: usize },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: unterminated raw string")]
    UnterminatedRawString { line: usize },

    #[error("line {line}: unterminated block comment")]
    UnterminatedComment { line: usize },

    #[error("missing package clause")]
    MissingPackage,

    #[error("line {line}: malformed package clause")]
    MalformedPackage { line: usize },

    #[error("line {line}: unexpected package clause")]
    UnexpectedPackage { line: usize },

    #[error("line {line}: malformed import '{text}'")]
    MalformedImport { line: usize, text: String },

    #[error("line {line}: unsupported member '{text}'")]
    UnsupportedMember { line: usize, text: String },
}

type ParseResult<T> = std::result::Result<T, GoSourceError>;

/// Standard library roots, grouped ahead of module imports.
const STD_ROOTS: &[&str] = &[
    "archive", "bufio", "bytes", "cmp", "compress", "container", "context", "crypto", "database",
    "embed", "encoding", "errors", "expvar", "flag", "fmt", "go", "hash", "html", "image", "io",
    "iter", "log", "maps", "math", "mime", "net", "os", "path", "reflect", "regexp", "runtime",
    "slices", "sort", "strconv", "strings", "sync", "syscall", "testing", "text", "time",
    "unicode", "unsafe",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoFile {
    /// Comment lines directly above the package clause
    pub package_doc: Vec<String>,
    pub package: String,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub alias: Option<String>,
    pub path: String,
}

impl Import {
    pub fn new(path: &str) -> Self {
        Import {
            alias: None,
            path: path.to_string(),
        }
    }

    fn is_std(&self) -> bool {
        let root = self.path.split('/').next().unwrap_or_default();
        STD_ROOTS.contains(&root)
    }

    fn spec(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} \"{}\"", alias, self.path),
            None => format!("\"{}\"", self.path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Struct(StructDecl),
    Interface(InterfaceDecl),
    Other(OtherDecl),
}

impl Decl {
    /// Name of the declared type, if this declares one.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Decl::Struct(decl) => Some(&decl.name),
            Decl::Interface(decl) => Some(&decl.name),
            Decl::Other(OtherDecl {
                kind: OtherKind::Type(name),
                ..
            }) => Some(name),
            Decl::Other(_) => None,
        }
    }

    pub fn doc(&self) -> &[String] {
        match self {
            Decl::Struct(decl) => &decl.doc,
            Decl::Interface(decl) => &decl.doc,
            Decl::Other(decl) => &decl.doc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub doc: Vec<String>,
    pub name: String,
    pub members: Vec<StructMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructMember {
    Field(StructField),
    /// `// ...` line inside the body
    Comment(String),
    Blank,
}

/// One struct field line. `names` is empty for an embedded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub names: Vec<String>,
    pub ty: String,
    /// Tag contents without the surrounding backticks
    pub tag: Option<String>,
    /// Trailing `// ...` comment
    pub comment: Option<String>,
}

impl StructField {
    pub fn new(name: &str, ty: &str) -> Self {
        StructField {
            names: vec![name.to_string()],
            ty: ty.to_string(),
            tag: None,
            comment: None,
        }
    }

    pub fn with_tag(mut self, tag: String) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }

    pub fn has_name(&self, name: &str) -> bool {
        if self.is_embedded() {
            let ty = self.ty.trim_start_matches('*');
            let base = ty.rsplit('.').next().unwrap_or(ty);
            return base == name;
        }
        self.names.iter().any(|n| n == name)
    }

    /// Value of `key` in the struct tag (`db` in `json:"x" db:"y"`).
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tag.as_deref().and_then(|tag| lookup_tag(tag, key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub doc: Vec<String>,
    pub name: String,
    pub members: Vec<InterfaceMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceMember {
    /// `Name(params) results`; `signature` starts at the opening paren
    Method { name: String, signature: String },
    Embedded(String),
    Comment(String),
    Blank,
}

impl InterfaceDecl {
    pub fn has_method(&self, name: &str) -> bool {
        self.members
            .iter()
            .any(|member| matches!(member, InterfaceMember::Method { name: n, .. } if n == name))
    }

    pub fn push_method(&mut self, name: &str, signature: &str) {
        self.members.push(InterfaceMember::Method {
            name: name.to_string(),
            signature: signature.to_string(),
        });
    }
}

/// Any declaration kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherDecl {
    pub doc: Vec<String>,
    pub kind: OtherKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtherKind {
    Type(String),
    Func {
        receiver: Option<String>,
        name: String,
    },
    Const,
    Var,
    /// Free-standing comment group
    Comment,
    Unknown,
}

impl StructDecl {
    pub fn new(name: &str) -> Self {
        StructDecl {
            doc: Vec::new(),
            name: name.to_string(),
            members: Vec::new(),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &StructField> {
        self.members.iter().filter_map(|member| match member {
            StructMember::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields().any(|field| field.has_name(name))
    }

    pub fn push_field(&mut self, field: StructField) {
        self.members.push(StructMember::Field(field));
    }

    /// Insert `field` ahead of the first field matching `anchor`, or append.
    pub fn insert_field_before<F>(&mut self, field: StructField, anchor: F)
    where
        F: Fn(&StructField) -> bool,
    {
        let position = self.members.iter().position(|member| match member {
            StructMember::Field(existing) => anchor(existing),
            _ => false,
        });
        match position {
            Some(idx) => self.members.insert(idx, StructMember::Field(field)),
            None => self.push_field(field),
        }
    }

    /// Remove the attribute `name`. A grouped field (`A, B int`) only loses
    /// that name. Returns whether anything was removed.
    pub fn remove_field(&mut self, name: &str) -> bool {
        let mut removed = false;
        self.members.retain_mut(|member| {
            let StructMember::Field(field) = member else {
                return true;
            };
            if field.is_embedded() || !field.names.iter().any(|n| n == name) {
                return true;
            }
            removed = true;
            field.names.retain(|n| n != name);
            !field.names.is_empty()
        });
        removed
    }
}

impl GoFile {
    pub fn new(package: &str) -> Self {
        GoFile {
            package: package.to_string(),
            ..Default::default()
        }
    }

    /// Parse a complete Go source file.
    pub fn parse(src: &str) -> ParseResult<GoFile> {
        Parser::new(src).parse(true)
    }

    pub fn type_decl(&self, name: &str) -> Option<&Decl> {
        self.decls.iter().find(|decl| decl.type_name() == Some(name))
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.type_decl(name).is_some()
    }

    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Struct(s) if s.name == name => Some(s),
            _ => None,
        })
    }

    pub fn struct_decl_mut(&mut self, name: &str) -> Option<&mut StructDecl> {
        self.decls.iter_mut().find_map(|decl| match decl {
            Decl::Struct(s) if s.name == name => Some(s),
            _ => None,
        })
    }

    pub fn interface_decl_mut(&mut self, name: &str) -> Option<&mut InterfaceDecl> {
        self.decls.iter_mut().find_map(|decl| match decl {
            Decl::Interface(i) if i.name == name => Some(i),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Struct(s) => Some(s),
            _ => None,
        })
    }

    /// Whether a function (or method on `receiver`) named `name` is declared.
    pub fn has_func(&self, receiver: Option<&str>, name: &str) -> bool {
        self.decls.iter().any(|decl| match decl {
            Decl::Other(OtherDecl {
                kind: OtherKind::Func { receiver: r, name: n },
                ..
            }) => n == name && r.as_deref() == receiver,
            _ => false,
        })
    }

    /// Insert `decls` ahead of the type `name`, or append them.
    pub fn insert_decls_before(&mut self, name: &str, decls: Vec<Decl>) {
        let idx = self
            .decls
            .iter()
            .position(|decl| decl.type_name() == Some(name))
            .unwrap_or(self.decls.len());
        self.decls.splice(idx..idx, decls);
    }

    pub fn has_import(&self, path: &str) -> bool {
        self.imports.iter().any(|import| import.path == path)
    }

    pub fn add_import(&mut self, path: &str) {
        if !self.has_import(path) {
            self.imports.push(Import::new(path));
        }
    }

    pub fn remove_import(&mut self, path: &str) -> bool {
        let before = self.imports.len();
        self.imports.retain(|import| import.path != path);
        before != self.imports.len()
    }

    /// Whether any declaration's code (not comments) refers to `pkg.`.
    pub fn uses_package(&self, pkg: &str) -> bool {
        self.decls.iter().any(|decl| match decl {
            Decl::Struct(s) => s.fields().any(|field| contains_qualifier(&field.ty, pkg)),
            Decl::Interface(i) => i.members.iter().any(|member| match member {
                InterfaceMember::Method { signature, .. } => contains_qualifier(signature, pkg),
                InterfaceMember::Embedded(text) => contains_qualifier(text, pkg),
                _ => false,
            }),
            Decl::Other(OtherDecl {
                kind: OtherKind::Comment,
                ..
            }) => false,
            Decl::Other(other) => other
                .text
                .lines()
                .any(|line| contains_qualifier(tokens::split_comment(line).0, pkg)),
        })
    }

    /// Render the file as Go source.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if !self.package.is_empty() {
            push_lines(&mut out, &self.package_doc);
            out.push_str(&format!("package {}\n", self.package));
            if !self.imports.is_empty() || !self.decls.is_empty() {
                out.push('\n');
            }
        }

        if !self.imports.is_empty() {
            render_imports(&mut out, &self.imports);
            if !self.decls.is_empty() {
                out.push('\n');
            }
        }

        render_decls(&mut out, &self.decls);
        out
    }
}

/// Parse a run of top-level declarations without a package clause.
pub fn parse_decls(src: &str) -> ParseResult<Vec<Decl>> {
    Parser::new(src).parse(false).map(|file| file.decls)
}

/// Render declarations separated by blank lines.
pub fn render_decls(out: &mut String, decls: &[Decl]) {
    for (idx, decl) in decls.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        render_decl(out, decl);
    }
}

fn contains_qualifier(text: &str, pkg: &str) -> bool {
    let needle = format!("{}.", pkg);
    text.match_indices(&needle).any(|(idx, _)| {
        text[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '.'))
    })
}

/// Build a struct tag from key/value pairs: `json:"id" db:"id"`.
pub fn format_tag(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}:\"{}\"", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up `key` in a struct tag.
pub fn lookup_tag<'a>(tag: &'a str, key: &str) -> Option<&'a str> {
    let (_, pairs) = tokens::tag_pairs(tag).ok()?;
    pairs
        .into_iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn push_lines(out: &mut String, lines: &[String]) {
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
}

fn render_imports(out: &mut String, imports: &[Import]) {
    if let [single] = imports {
        out.push_str(&format!("import {}\n", single.spec()));
        return;
    }

    let (mut std, mut external): (Vec<&Import>, Vec<&Import>) =
        imports.iter().partition(|import| import.is_std());
    std.sort_by(|a, b| a.path.cmp(&b.path));
    external.sort_by(|a, b| a.path.cmp(&b.path));

    out.push_str("import (\n");
    for import in &std {
        out.push_str(&format!("\t{}\n", import.spec()));
    }
    if !std.is_empty() && !external.is_empty() {
        out.push('\n');
    }
    for import in &external {
        out.push_str(&format!("\t{}\n", import.spec()));
    }
    out.push_str(")\n");
}

fn render_decl(out: &mut String, decl: &Decl) {
    push_lines(out, decl.doc());
    match decl {
        Decl::Struct(s) => {
            out.push_str(&format!("type {} struct {{\n", s.name));
            render_struct_members(out, &s.members);
            out.push_str("}\n");
        }
        Decl::Interface(i) => {
            out.push_str(&format!("type {} interface {{\n", i.name));
            for member in &i.members {
                match member {
                    InterfaceMember::Method { name, signature } => {
                        out.push_str(&format!("\t{}{}\n", name, signature))
                    }
                    InterfaceMember::Embedded(text) | InterfaceMember::Comment(text) => {
                        out.push_str(&format!("\t{}\n", text))
                    }
                    InterfaceMember::Blank => out.push('\n'),
                }
            }
            out.push_str("}\n");
        }
        Decl::Other(other) => {
            out.push_str(&other.text);
            out.push('\n');
        }
    }
}

fn render_struct_members(out: &mut String, members: &[StructMember]) {
    let mut idx = 0;
    while idx < members.len() {
        match &members[idx] {
            StructMember::Blank => {
                out.push('\n');
                idx += 1;
            }
            StructMember::Comment(text) => {
                out.push_str(&format!("\t{}\n", text));
                idx += 1;
            }
            StructMember::Field(_) => {
                // Consecutive fields form one alignment block.
                let start = idx;
                while idx < members.len() && matches!(members[idx], StructMember::Field(_)) {
                    idx += 1;
                }
                let rows: Vec<Vec<String>> = members[start..idx]
                    .iter()
                    .filter_map(|member| match member {
                        StructMember::Field(field) => Some(field_cells(field)),
                        _ => None,
                    })
                    .collect();
                render_aligned(out, &rows);
            }
        }
    }
}

fn field_cells(field: &StructField) -> Vec<String> {
    let mut cells = Vec::with_capacity(4);
    if !field.names.is_empty() {
        cells.push(field.names.join(", "));
    }
    cells.push(field.ty.clone());
    if let Some(tag) = &field.tag {
        if tag.contains('`') {
            cells.push(format!("{:?}", tag));
        } else {
            cells.push(format!("`{}`", tag));
        }
    }
    if let Some(comment) = &field.comment {
        cells.push(comment.clone());
    }
    cells
}

fn render_aligned(out: &mut String, rows: &[Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            if col + 1 < row.len() {
                widths[col] = widths[col].max(cell.chars().count());
            }
        }
    }

    for row in rows {
        out.push('\t');
        for (col, cell) in row.iter().enumerate() {
            out.push_str(cell);
            if col + 1 < row.len() {
                let padding = widths[col] + 1 - cell.chars().count();
                out.push_str(&" ".repeat(padding));
            }
        }
        out.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Tracks nesting and multi-line literals across lines.
#[derive(Default)]
struct Scanner {
    depth: usize,
    raw_string_from: Option<usize>,
    block_comment_from: Option<usize>,
}

impl Scanner {
    fn is_idle(&self) -> bool {
        self.depth == 0 && self.raw_string_from.is_none() && self.block_comment_from.is_none()
    }

    fn scan(&mut self, line: &str, line_no: usize) -> ParseResult<()> {
        let mut input = line;
        while !input.is_empty() {
            if self.block_comment_from.is_some() {
                let Ok((rest, _)) = tokens::block_comment_end(input) else {
                    return Ok(());
                };
                self.block_comment_from = None;
                input = rest;
                continue;
            }
            if self.raw_string_from.is_some() {
                let Ok((rest, _)) = tokens::raw_string_end(input) else {
                    return Ok(());
                };
                self.raw_string_from = None;
                input = rest;
                continue;
            }

            let Ok((rest, token)) = tokens::token(input) else {
                return Ok(());
            };
            match token {
                Token::LineComment => return Ok(()),
                Token::OpenBlockComment => {
                    self.block_comment_from = Some(line_no);
                    return Ok(());
                }
                Token::OpenRawString => {
                    self.raw_string_from = Some(line_no);
                    return Ok(());
                }
                Token::UnterminatedString => {
                    return Err(GoSourceError::UnterminatedString { line: line_no })
                }
                Token::Open => self.depth += 1,
                Token::Close(found) => {
                    self.depth = self
                        .depth
                        .checked_sub(1)
                        .ok_or(GoSourceError::UnbalancedDelimiter {
                            line: line_no,
                            found,
                        })?;
                }
                Token::Other => {}
            }
            input = rest;
        }
        Ok(())
    }

    fn finish(&self, decl_line: usize) -> ParseResult<()> {
        if let Some(line) = self.raw_string_from {
            return Err(GoSourceError::UnterminatedRawString { line });
        }
        if let Some(line) = self.block_comment_from {
            return Err(GoSourceError::UnterminatedComment { line });
        }
        if self.depth > 0 {
            return Err(GoSourceError::UnclosedDeclaration { line: decl_line });
        }
        Ok(())
    }
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            lines: src.lines().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn parse(mut self, with_package: bool) -> ParseResult<GoFile> {
        let mut file = GoFile::default();
        let mut seen_package = false;
        let mut pending: Vec<String> = Vec::new();

        while let Some(line) = self.peek() {
            let line_no = self.pos + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                self.pos += 1;
                flush_comment(&mut file.decls, &mut pending);
                continue;
            }
            if trimmed.starts_with("//") {
                pending.push(trimmed.to_string());
                self.pos += 1;
                continue;
            }
            if trimmed.starts_with("/*") {
                let lines = self.block_comment()?;
                pending.extend(lines);
                continue;
            }

            match first_word(trimmed) {
                "package" => {
                    if !with_package || seen_package {
                        return Err(GoSourceError::UnexpectedPackage { line: line_no });
                    }
                    let (clause, _) = tokens::split_comment(trimmed);
                    let (_, name) = tokens::package_clause(clause)
                        .map_err(|_| GoSourceError::MalformedPackage { line: line_no })?;
                    file.package = name.to_string();
                    file.package_doc = std::mem::take(&mut pending);
                    seen_package = true;
                    self.pos += 1;
                }
                "import" => {
                    flush_comment(&mut file.decls, &mut pending);
                    self.imports(&mut file.imports)?;
                }
                _ => {
                    let doc = std::mem::take(&mut pending);
                    let decl = self.declaration(doc)?;
                    file.decls.push(decl);
                }
            }
        }

        flush_comment(&mut file.decls, &mut pending);
        if with_package && !seen_package {
            return Err(GoSourceError::MissingPackage);
        }
        Ok(file)
    }

    fn block_comment(&mut self) -> ParseResult<Vec<String>> {
        let start = self.pos + 1;
        let mut lines = Vec::new();
        while let Some(line) = self.peek() {
            self.pos += 1;
            lines.push(line.trim_end().to_string());
            let body = if lines.len() == 1 {
                line.trim_start().get(2..).unwrap_or_default()
            } else {
                line
            };
            if tokens::block_comment_end(body).is_ok() {
                return Ok(lines);
            }
        }
        Err(GoSourceError::UnterminatedComment { line: start })
    }

    fn imports(&mut self, imports: &mut Vec<Import>) -> ParseResult<()> {
        let start = self.pos + 1;
        let line = self.lines[self.pos];
        self.pos += 1;

        let (code, _) = tokens::split_comment(line.trim());
        let rest = code["import".len()..].trim();

        let Some(group) = rest.strip_prefix('(') else {
            imports.push(parse_import_spec(rest, start)?);
            return Ok(());
        };

        match group.trim() {
            ")" => return Ok(()),
            "" => {}
            other => {
                return Err(GoSourceError::MalformedImport {
                    line: start,
                    text: other.to_string(),
                })
            }
        }

        while let Some(line) = self.peek() {
            let line_no = self.pos + 1;
            self.pos += 1;
            let (spec, _) = tokens::split_comment(line.trim());
            if spec.is_empty() {
                continue;
            }
            if spec == ")" {
                return Ok(());
            }
            imports.push(parse_import_spec(spec, line_no)?);
        }
        Err(GoSourceError::UnclosedDeclaration { line: start })
    }

    fn declaration(&mut self, doc: Vec<String>) -> ParseResult<Decl> {
        let start = self.pos + 1;
        let (header, _) = tokens::split_comment(self.lines[self.pos].trim());

        if let Ok((_, (name, body, closed))) = tokens::type_header(header) {
            let name = name.to_string();
            if closed {
                self.pos += 1;
                return Ok(match body {
                    BodyKind::Struct => Decl::Struct(StructDecl {
                        doc,
                        name,
                        members: Vec::new(),
                    }),
                    BodyKind::Interface => Decl::Interface(InterfaceDecl {
                        doc,
                        name,
                        members: Vec::new(),
                    }),
                });
            }
            return match body {
                BodyKind::Struct => self.struct_body(doc, name, start),
                BodyKind::Interface => self.interface_body(doc, name, start),
            };
        }

        self.other(doc, start)
    }

    fn struct_body(&mut self, doc: Vec<String>, name: String, start: usize) -> ParseResult<Decl> {
        self.pos += 1;
        let mut members = Vec::new();
        while let Some(line) = self.peek() {
            let line_no = self.pos + 1;
            self.pos += 1;
            let trimmed = line.trim();
            if tokens::closing_brace(trimmed).is_ok() {
                return Ok(Decl::Struct(StructDecl { doc, name, members }));
            }
            members.push(parse_struct_member(trimmed, line_no)?);
        }
        Err(GoSourceError::UnclosedDeclaration { line: start })
    }

    fn interface_body(&mut self, doc: Vec<String>, name: String, start: usize) -> ParseResult<Decl> {
        self.pos += 1;
        let mut members = Vec::new();
        while let Some(line) = self.peek() {
            let line_no = self.pos + 1;
            self.pos += 1;
            let trimmed = line.trim();
            if tokens::closing_brace(trimmed).is_ok() {
                return Ok(Decl::Interface(InterfaceDecl { doc, name, members }));
            }
            members.push(parse_interface_member(trimmed, line_no)?);
        }
        Err(GoSourceError::UnclosedDeclaration { line: start })
    }

    fn other(&mut self, doc: Vec<String>, start: usize) -> ParseResult<Decl> {
        let kind = classify(self.lines[self.pos].trim());
        let mut scanner = Scanner::default();
        let mut text = Vec::new();

        while let Some(line) = self.peek() {
            let line_no = self.pos + 1;
            self.pos += 1;
            scanner.scan(line, line_no)?;
            text.push(line.trim_end());
            if scanner.is_idle() {
                return Ok(Decl::Other(OtherDecl {
                    doc,
                    kind,
                    text: text.join("\n"),
                }));
            }
        }

        scanner.finish(start)?;
        Err(GoSourceError::UnclosedDeclaration { line: start })
    }
}

fn flush_comment(decls: &mut Vec<Decl>, pending: &mut Vec<String>) {
    if pending.is_empty() {
        return;
    }
    decls.push(Decl::Other(OtherDecl {
        doc: Vec::new(),
        kind: OtherKind::Comment,
        text: std::mem::take(pending).join("\n"),
    }));
}

fn first_word(line: &str) -> &str {
    tokens::keyword(line).map_or("", |(_, word)| word)
}

fn parse_import_spec(spec: &str, line_no: usize) -> ParseResult<Import> {
    match tokens::import_spec(spec) {
        Ok((_, (alias, path))) if !path.is_empty() => Ok(Import {
            alias: alias.map(str::to_string),
            path: path.to_string(),
        }),
        _ => Err(GoSourceError::MalformedImport {
            line: line_no,
            text: spec.to_string(),
        }),
    }
}

/// Members must fit on one line; anonymous structs and multi-line tags
/// are rejected.
fn single_line_member(trimmed: &str, line_no: usize) -> ParseResult<()> {
    let mut scanner = Scanner::default();
    scanner.scan(trimmed, line_no)?;
    if !scanner.is_idle() {
        return Err(GoSourceError::UnsupportedMember {
            line: line_no,
            text: trimmed.to_string(),
        });
    }
    Ok(())
}

fn parse_struct_member(trimmed: &str, line_no: usize) -> ParseResult<StructMember> {
    if trimmed.is_empty() {
        return Ok(StructMember::Blank);
    }
    if trimmed.starts_with("//") {
        return Ok(StructMember::Comment(trimmed.to_string()));
    }
    single_line_member(trimmed, line_no)?;

    let (_, line) = tokens::field_line(trimmed).map_err(|_| GoSourceError::UnsupportedMember {
        line: line_no,
        text: trimmed.to_string(),
    })?;
    Ok(StructMember::Field(StructField {
        names: line.names.into_iter().map(str::to_string).collect(),
        ty: line.ty.to_string(),
        tag: line.tag,
        comment: line.comment.map(str::to_string),
    }))
}

fn parse_interface_member(trimmed: &str, line_no: usize) -> ParseResult<InterfaceMember> {
    if trimmed.is_empty() {
        return Ok(InterfaceMember::Blank);
    }
    if trimmed.starts_with("//") {
        return Ok(InterfaceMember::Comment(trimmed.to_string()));
    }
    single_line_member(trimmed, line_no)?;

    Ok(match tokens::method_spec(trimmed) {
        Ok((_, (name, signature))) => InterfaceMember::Method {
            name: name.to_string(),
            signature: signature.to_string(),
        },
        Err(_) => InterfaceMember::Embedded(trimmed.to_string()),
    })
}

fn classify(line: &str) -> OtherKind {
    let (header, _) = tokens::split_comment(line);
    match first_word(header) {
        "type" => tokens::type_name(header)
            .map_or(OtherKind::Unknown, |(_, name)| OtherKind::Type(name.to_string())),
        "func" => tokens::func_header(header).map_or(OtherKind::Unknown, |(_, (receiver, name))| {
            OtherKind::Func {
                receiver: receiver.map(str::to_string),
                name: name.to_string(),
            }
        }),
        "const" => OtherKind::Const,
        "var" => OtherKind::Var,
        _ => OtherKind::Unknown,
    }
}
