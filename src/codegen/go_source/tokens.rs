//! Token-level parsers for generated Go source.
//!
//! Each parser works on a single line. The line-oriented walker in the parent
//! module decides which one applies and keeps nesting state across lines.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_till, take_until, take_while, take_while1},
    character::complete::{anychar, char, not_line_ending, one_of, satisfy, space0, space1},
    combinator::{eof, map, not, opt, recognize, rest, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

/// Parse a Go identifier.
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// Leading word of a line, up to whitespace, `(` or `"`.
pub fn keyword(input: &str) -> IResult<&str, &str> {
    take_till(|c: char| c.is_whitespace() || c == '(' || c == '"')(input)
}

/// Parse a `//` comment running to the end of the line.
pub fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), not_line_ending))(input)
}

fn string_body(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((
        is_not("\"\\"),
        recognize(pair(char('\\'), anychar)),
    ))))(input)
}

fn rune_body(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((
        is_not("'\\"),
        recognize(pair(char('\\'), anychar)),
    ))))(input)
}

/// Parse a double-quoted string. Returns the body with escapes left in place.
pub fn interpreted_string(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), string_body, char('"'))(input)
}

/// Parse a backquoted raw string. Returns the body.
pub fn raw_string(input: &str) -> IResult<&str, &str> {
    delimited(char('`'), take_while(|c: char| c != '`'), char('`'))(input)
}

fn rune(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), rune_body, char('\''))(input)
}

/// Any literal, quotes included.
fn literal(input: &str) -> IResult<&str, &str> {
    recognize(alt((interpreted_string, raw_string, rune)))(input)
}

/// Code up to a `//` comment, skipping over literals.
fn code(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((
        literal,
        is_not("\"'`/"),
        recognize(terminated(char('/'), not(char('/')))),
    ))))(input)
}

/// Split a line into its code and trailing comment. A line holding an
/// unterminated literal comes back whole, without a comment.
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    match code(line) {
        Ok((rest, code)) => match line_comment(rest) {
            Ok(("", comment)) => (code.trim_end(), Some(comment)),
            _ => (line, None),
        },
        Err(_) => (line, None),
    }
}

/// Lexical units that matter for nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Open,
    Close(char),
    LineComment,
    /// `/*` with no `*/` on the same line
    OpenBlockComment,
    /// Backquote with no closing backquote on the same line
    OpenRawString,
    /// Quote with no closing quote
    UnterminatedString,
    Other,
}

/// Parse the next token of a line.
pub fn token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LineComment, line_comment),
        value(
            Token::Other,
            recognize(tuple((tag("/*"), take_until("*/"), tag("*/")))),
        ),
        value(Token::OpenBlockComment, preceded(tag("/*"), rest)),
        value(Token::Other, raw_string),
        value(Token::OpenRawString, preceded(char('`'), rest)),
        value(Token::Other, interpreted_string),
        value(Token::Other, rune),
        value(Token::UnterminatedString, preceded(one_of("\"'"), rest)),
        value(Token::Open, one_of("{([")),
        map(one_of("})]"), Token::Close),
        value(Token::Other, is_not("/`\"'{}()[]")),
        value(Token::Other, anychar),
    ))(input)
}

/// Rest of a raw string opened on an earlier line.
pub fn raw_string_end(input: &str) -> IResult<&str, &str> {
    terminated(take_till(|c: char| c == '`'), char('`'))(input)
}

/// Rest of a block comment opened on an earlier line.
pub fn block_comment_end(input: &str) -> IResult<&str, &str> {
    terminated(take_until("*/"), tag("*/"))(input)
}

/// Parse `package name`.
pub fn package_clause(input: &str) -> IResult<&str, &str> {
    terminated(
        preceded(pair(tag("package"), space1), identifier),
        pair(space0, eof),
    )(input)
}

/// Parse an import spec: optional alias, then the quoted path.
pub fn import_spec(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    terminated(
        pair(
            opt(terminated(alt((identifier, tag("."))), space1)),
            alt((interpreted_string, raw_string)),
        ),
        pair(space0, eof),
    )(input)
}

/// Parse the `}` closing a type body, optionally followed by a comment.
pub fn closing_brace(input: &str) -> IResult<&str, ()> {
    value((), tuple((space0, char('}'), space0, opt(line_comment), eof)))(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Struct,
    Interface,
}

/// Parse `type Name`.
pub fn type_name(input: &str) -> IResult<&str, &str> {
    preceded(pair(tag("type"), space1), identifier)(input)
}

/// Parse `type Name struct {` or `type Name interface {}`. Returns the name,
/// the body kind, and whether the body closes on the same line.
pub fn type_header(input: &str) -> IResult<&str, (&str, BodyKind, bool)> {
    let (input, name) = type_name(input)?;
    let (input, kind) = preceded(
        space1,
        alt((
            value(BodyKind::Struct, tag("struct")),
            value(BodyKind::Interface, tag("interface")),
        )),
    )(input)?;
    let (input, _) = pair(space0, char('{'))(input)?;
    let (input, closed) = opt(preceded(space0, char('}')))(input)?;
    let (input, _) = pair(space0, eof)(input)?;
    Ok((input, (name, kind, closed.is_some())))
}

/// Parse a method receiver `(r *Type[K])`. Returns the bare type name.
fn receiver(input: &str) -> IResult<&str, &str> {
    delimited(
        pair(char('('), space0),
        preceded(
            opt(pair(identifier, space1)),
            preceded(opt(char('*')), identifier),
        ),
        pair(take_till(|c: char| c == ')'), char(')')),
    )(input)
}

/// Parse `func Name` or `func (r *Type) Name`.
pub fn func_header(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    preceded(
        pair(tag("func"), space0),
        pair(opt(terminated(receiver, space0)), identifier),
    )(input)
}

/// Parse an interface method: the name, and everything from the opening paren.
pub fn method_spec(input: &str) -> IResult<&str, (&str, &str)> {
    pair(identifier, recognize(pair(char('('), rest)))(input)
}

fn tag_pair(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        take_while1(|c: char| c != ':' && c != '"' && !c.is_whitespace()),
        char(':'),
        interpreted_string,
    )(input)
}

/// Parse the `key:"value"` pairs of a struct tag, up to the first malformed one.
pub fn tag_pairs(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    many0(preceded(space0, tag_pair))(input)
}

/// One parsed struct field line. `names` is empty for an embedded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLine<'a> {
    pub names: Vec<&'a str>,
    pub ty: &'a str,
    /// Tag contents, unquoted
    pub tag: Option<String>,
    pub comment: Option<&'a str>,
}

fn field_names(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(tuple((space0, char(','), space0)), identifier)(input)
}

/// Words of a field type, stopping at a tag or a comment.
fn field_type(input: &str) -> IResult<&str, &str> {
    recognize(separated_list1(space1, is_not(" \t`\"/")))(input)
}

/// `T`, `*T`, `pkg.T` or `*pkg.T`.
fn embedded_type(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('*')),
        identifier,
        opt(pair(char('.'), identifier)),
    )))(input)
}

fn unescape(body: &str) -> String {
    body.replace("\\\"", "\"").replace("\\\\", "\\")
}

fn struct_tag(input: &str) -> IResult<&str, String> {
    alt((
        map(raw_string, str::to_string),
        map(interpreted_string, unescape),
    ))(input)
}

/// Parse a struct field line: names, type, tag, comment.
pub fn field_line(input: &str) -> IResult<&str, FieldLine<'_>> {
    let (input, (names, ty)) = alt((
        separated_pair(field_names, space1, field_type),
        map(embedded_type, |ty| (Vec::new(), ty)),
    ))(input)?;
    let (input, tag) = opt(preceded(space1, struct_tag))(input)?;
    let (input, comment) = opt(preceded(space0, line_comment))(input)?;
    let (input, _) = pair(space0, eof)(input)?;
    Ok((
        input,
        FieldLine {
            names,
            ty,
            tag,
            comment,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("AuthorID int64"), Ok((" int64", "AuthorID")));
        assert_eq!(identifier("_x"), Ok(("", "_x")));
        assert!(identifier("9lives").is_err());
    }

    #[test]
    fn test_split_comment() {
        assert_eq!(split_comment("x := 1 // one"), ("x := 1", Some("// one")));
        assert_eq!(
            split_comment(r#"s := "http://x" // url"#),
            (r#"s := "http://x""#, Some("// url"))
        );
        assert_eq!(split_comment("a / b"), ("a / b", None));
        assert_eq!(split_comment("s := `raw // no`"), ("s := `raw // no`", None));
        assert_eq!(split_comment(r#"s := "open // x"#), (r#"s := "open // x"#, None));
    }

    #[test]
    fn test_tokens() {
        let mut input = r#"f("}", '(', `{`) { /* ) */"#;
        let mut tokens = Vec::new();
        while !input.is_empty() {
            let (rest, next) = token(input).unwrap();
            if next != Token::Other {
                tokens.push(next);
            }
            input = rest;
        }
        assert_eq!(tokens, vec![Token::Open, Token::Close(')'), Token::Open]);

        assert_eq!(token("/* open").unwrap().1, Token::OpenBlockComment);
        assert_eq!(token("`open").unwrap().1, Token::OpenRawString);
        assert_eq!(token("\"open").unwrap().1, Token::UnterminatedString);
        assert_eq!(raw_string_end("tail` + x"), Ok((" + x", "tail")));
        assert_eq!(block_comment_end("done */ y"), Ok((" y", "done ")));
    }

    #[test]
    fn test_field_line() {
        let (_, field) =
            field_line(r#"ID        int64  `json:"id" db:"id"` // key"#).unwrap();
        assert_eq!(field.names, vec!["ID"]);
        assert_eq!(field.ty, "int64");
        assert_eq!(field.tag.as_deref(), Some(r#"json:"id" db:"id""#));
        assert_eq!(field.comment, Some("// key"));

        let (_, grouped) = field_line("A, B map[string]interface{}").unwrap();
        assert_eq!(grouped.names, vec!["A", "B"]);
        assert_eq!(grouped.ty, "map[string]interface{}");

        let (_, embedded) = field_line("*pkg.Base `db:\"-\"`").unwrap();
        assert!(embedded.names.is_empty());
        assert_eq!(embedded.ty, "*pkg.Base");

        let (_, quoted) = field_line(r#"Note string "a:\"b\"""#).unwrap();
        assert_eq!(quoted.tag.as_deref(), Some(r#"a:"b""#));

        assert!(field_line("A, B").is_err());
    }

    #[test]
    fn test_tag_pairs() {
        let (_, pairs) = tag_pairs(r#"json:"posts,omitempty" db:"-""#).unwrap();
        assert_eq!(pairs, vec![("json", "posts,omitempty"), ("db", "-")]);
        assert_eq!(tag_pairs("garbage").unwrap().1, Vec::new());
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            func_header("func (r *postRepository[T]) List(ctx context.Context)"),
            Ok(("(ctx context.Context)", (Some("postRepository"), "List")))
        );
        assert_eq!(func_header("func New() *T"), Ok(("() *T", (None, "New"))));
        assert_eq!(
            type_header("type Post struct {"),
            Ok(("", ("Post", BodyKind::Struct, false)))
        );
        assert_eq!(
            type_header("type Repo interface{}"),
            Ok(("", ("Repo", BodyKind::Interface, true)))
        );
        assert!(type_header("type Status string").is_err());
        assert_eq!(
            import_spec(r#"m "myapp/models""#),
            Ok(("", (Some("m"), "myapp/models")))
        );
        assert_eq!(import_spec("`time`"), Ok(("", (None, "time"))));
        assert!(import_spec("time").is_err());
        assert_eq!(package_clause("package models"), Ok(("", "models")));
        assert!(closing_brace("} // end").is_ok());
        assert!(closing_brace("}, x").is_err());
        assert_eq!(
            method_spec("GetByID(ctx context.Context) error"),
            Ok(("", ("GetByID", "(ctx context.Context) error")))
        );
    }
}
