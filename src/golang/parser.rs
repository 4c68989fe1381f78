//! Parser for Go `type` declarations.
//!
//! Only what structsync edits is parsed into structure: the package clause,
//! every top-level `type` spec, and the fields of struct types. Everything
//! else stays in the source text untouched.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};

use super::lexer::{tokenize, Token, TokenKind};
use super::types::{
    Decorations, FieldNode, SourceFile, Spacing, StructType, TypeExpr, TypeKind, TypeSpec,
};

/// Read and parse a Go file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<SourceFile> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| Error::source_read(path, e))?;
    parse_source(path, source)
}

/// Parse Go source text that was read from `path`.
pub fn parse_source(path: impl AsRef<Path>, source: impl Into<String>) -> Result<SourceFile> {
    let path = path.as_ref();
    let source = source.into();
    let tokens = tokenize(&source).map_err(|e| Error::parse(path, e.line, e.message))?;

    let (package, specs) = {
        let mut parser = Parser {
            source: &source,
            tokens,
            path,
        };
        parser.parse_top_level()?
    };

    Ok(SourceFile {
        path: path.to_path_buf(),
        source,
        package,
        specs,
    })
}

/// Parse a standalone type expression; `None` if it is not exactly one type.
pub(crate) fn parse_type_expr(text: &str) -> Option<TypeExpr> {
    let tokens = tokenize(text).ok()?;
    let parser = Parser {
        source: text,
        tokens,
        path: Path::new("<type>"),
    };
    let start = parser.skip_ws(0);
    let (ty, next) = parser.parse_type(start).ok()?;
    let rest = parser.skip_trivia(next);
    (rest == parser.tokens.len()).then_some(ty)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    path: &'a Path,
}

impl<'a> Parser<'a> {
    fn error(&self, index: usize, message: impl Into<String>) -> Error {
        let line = self
            .tokens
            .get(index)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1);
        Error::parse(self.path, line, message)
    }

    fn tok(&self, index: usize) -> Result<Token> {
        self.tokens
            .get(index)
            .copied()
            .ok_or_else(|| self.error(index, "unexpected end of file"))
    }

    fn text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    /// Next index at or after `i` that is not horizontal whitespace.
    fn skip_ws(&self, mut i: usize) -> usize {
        while self.tokens.get(i).is_some_and(Token::is_blank) {
            i += 1;
        }
        i
    }

    /// Next index at or after `i` that is not whitespace, a newline or a comment.
    fn skip_trivia(&self, mut i: usize) -> usize {
        while self
            .tokens
            .get(i)
            .is_some_and(|t| t.is_blank() || t.is_comment() || t.kind == TokenKind::Newline)
        {
            i += 1;
        }
        i
    }

    /// Previous index before `i` that is not horizontal whitespace.
    fn prev_non_ws(&self, i: usize) -> Option<usize> {
        let mut j = i;
        while j > 0 {
            j -= 1;
            if !self.tokens[j].is_blank() {
                return Some(j);
            }
        }
        None
    }

    /// Index of the bracket closing the one at `open`.
    fn matching(&self, open: usize) -> Result<usize> {
        let mut depth = 0usize;
        for (i, t) in self.tokens.iter().enumerate().skip(open) {
            match t.kind {
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
        }
        Err(self.error(open, "unbalanced brackets"))
    }

    fn parse_top_level(&mut self) -> Result<(Option<String>, Vec<TypeSpec>)> {
        let mut package = None;
        let mut specs = Vec::new();
        let mut depth = 0i32;
        let mut i = 0;

        while i < self.tokens.len() {
            let t = self.tokens[i];
            match t.kind {
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => depth -= 1,
                TokenKind::Ident if depth == 0 => match self.text(t) {
                    "package" if package.is_none() => {
                        let j = self.skip_ws(i + 1);
                        let name = self.tok(j)?;
                        if name.kind != TokenKind::Ident {
                            return Err(self.error(j, "expected package name"));
                        }
                        package = Some(self.text(name).to_string());
                        i = j + 1;
                        continue;
                    }
                    "type" => {
                        let doc = self.doc_before(i);
                        i = self.parse_type_decl(i + 1, doc, &mut specs)?;
                        continue;
                    }
                    _ => {}
                },
                _ => {}
            }
            i += 1;
        }

        if depth != 0 {
            return Err(self.error(self.tokens.len(), "unbalanced brackets at end of file"));
        }

        Ok((package, specs))
    }

    /// Comment lines directly above the token at `i`, with no blank line between.
    fn doc_before(&self, i: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut j = i;

        loop {
            let Some(nl) = self.prev_non_ws(j) else { break };
            if self.tokens[nl].kind != TokenKind::Newline {
                break;
            }
            let Some(c) = self.prev_non_ws(nl) else { break };
            let own_line = match self.prev_non_ws(c) {
                None => true,
                Some(p) => self.tokens[p].kind == TokenKind::Newline,
            };
            if !self.tokens[c].is_comment() || !own_line {
                break;
            }
            lines.push(self.text(self.tokens[c]).to_string());
            j = c;
        }

        lines.reverse();
        lines
    }

    /// Leading whitespace of the line holding the token at `i`.
    fn line_indent(&self, i: usize) -> String {
        let start = self.tokens[i].start;
        let line_start = self.source[..start].rfind('\n').map_or(0, |p| p + 1);
        self.source[line_start..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect()
    }

    fn parse_type_decl(
        &mut self,
        i: usize,
        doc: Vec<String>,
        specs: &mut Vec<TypeSpec>,
    ) -> Result<usize> {
        let j = self.skip_trivia(i);
        let t = self.tok(j)?;
        if !t.is_punct('(') {
            return self.parse_spec(j, doc, specs);
        }

        let mut k = j + 1;
        loop {
            k = self.skip_trivia(k);
            let t = self.tok(k)?;
            if t.is_punct(')') {
                return Ok(k + 1);
            }
            if t.is_punct(';') {
                k += 1;
                continue;
            }
            let doc = self.doc_before(k);
            k = self.parse_spec(k, doc, specs)?;
        }
    }

    fn parse_spec(
        &mut self,
        i: usize,
        doc: Vec<String>,
        specs: &mut Vec<TypeSpec>,
    ) -> Result<usize> {
        let name_tok = self.tok(i)?;
        if name_tok.kind != TokenKind::Ident {
            return Err(self.error(i, "expected type name"));
        }
        let name = self.text(name_tok).to_string();
        let indent = self.line_indent(i);

        let mut k = self.skip_ws(i + 1);
        if self.tok(k)?.is_punct('[') && self.is_type_params(k) {
            k = self.skip_ws(self.matching(k)? + 1);
        }
        if self.tok(k)?.is_punct('=') {
            k = self.skip_ws(k + 1);
        }

        let t = self.tok(k)?;
        if t.is_ident(self.source, "struct") {
            let open = self.skip_ws(k + 1);
            if self.tok(open)?.is_punct('{') {
                let (st, next) = self.parse_struct_body(open, indent)?;
                specs.push(TypeSpec {
                    name,
                    doc,
                    kind: TypeKind::Struct(st),
                    line: name_tok.line,
                });
                return Ok(next);
            }
        }

        let (text, next) = self.skip_type_to_end(k)?;
        specs.push(TypeSpec {
            name,
            doc,
            kind: TypeKind::Other(text),
            line: name_tok.line,
        });
        Ok(next)
    }

    /// `[T any]` versus an array length such as `[4]` or `[N]`.
    fn is_type_params(&self, open: usize) -> bool {
        let first = self.skip_ws(open + 1);
        if !self.tokens.get(first).is_some_and(|t| t.kind == TokenKind::Ident) {
            return false;
        }
        let second = self.skip_ws(first + 1);
        self.tokens.get(second).is_some_and(|t| {
            matches!(t.kind, TokenKind::Ident | TokenKind::Punct(',' | '~'))
        })
    }

    /// Consume a non-struct type up to the end of its spec.
    fn skip_type_to_end(&self, start: usize) -> Result<(String, usize)> {
        let mut depth = 0i32;
        let mut i = start;
        let mut last_end = self.tok(start)?.start;

        while let Some(t) = self.tokens.get(i) {
            match t.kind {
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Newline | TokenKind::Punct(';') if depth == 0 => break,
                _ => {}
            }
            if !(t.is_blank() || t.is_comment() || t.kind == TokenKind::Newline) {
                last_end = t.end;
            }
            i += 1;
        }

        let begin = self.tok(start)?.start;
        Ok((self.source[begin..last_end].to_string(), i))
    }

    fn parse_struct_body(&self, open: usize, indent: String) -> Result<(StructType, usize)> {
        let body_start = self.tok(open)?.end;
        let mut fields: Vec<FieldNode> = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        let mut pending_before = Spacing::NewLine;
        let mut newlines = 0usize;
        let mut on_field_line = false;
        let mut i = open + 1;

        let close = loop {
            let t = self
                .tokens
                .get(i)
                .copied()
                .ok_or_else(|| self.error(open, "struct type not terminated"))?;

            match t.kind {
                TokenKind::Whitespace | TokenKind::Punct(';') => i += 1,
                TokenKind::Newline => {
                    newlines += 1;
                    on_field_line = false;
                    i += 1;
                }
                TokenKind::LineComment | TokenKind::BlockComment => {
                    let text = self.text(t).to_string();
                    let after_field = !fields.is_empty();
                    match fields.last_mut() {
                        Some(last) if on_field_line => last.decs.end.push(text),
                        _ => {
                            if pending.is_empty() {
                                pending_before = spacing(newlines, after_field);
                            } else if newlines >= 2 {
                                pending.push(String::new());
                            }
                            pending.push(text);
                        }
                    }
                    newlines = 0;
                    i += 1;
                }
                TokenKind::Punct('}') => break i,
                _ => {
                    let before = if pending.is_empty() {
                        spacing(newlines, !fields.is_empty())
                    } else {
                        if newlines >= 2 {
                            pending.push(String::new());
                        }
                        pending_before
                    };
                    let (mut field, next) = self.parse_field(i)?;
                    field.decs.before = before;
                    field.decs.start = std::mem::take(&mut pending);
                    fields.push(field);
                    newlines = 0;
                    on_field_line = true;
                    i = next;
                }
            }
        };

        let mut trailing = Vec::new();
        if !pending.is_empty() {
            if pending_before == Spacing::EmptyLine {
                trailing.push(String::new());
            }
            trailing.append(&mut pending);
        }

        let st = StructType {
            fields,
            trailing,
            body: body_start..self.tokens[close].start,
            indent,
            replaced: false,
        };
        Ok((st, close + 1))
    }

    fn parse_field(&self, i: usize) -> Result<(FieldNode, usize)> {
        let t = self.tok(i)?;
        let mut names = Vec::new();

        let type_start = match t.kind {
            TokenKind::Ident => {
                let n = self.skip_ws(i + 1);
                match self.tokens.get(n).map(|t| t.kind) {
                    Some(TokenKind::Punct(',')) => {
                        names.push(self.text(t).to_string());
                        let mut k = n;
                        while self.tok(k)?.is_punct(',') {
                            let name_idx = self.skip_trivia(k + 1);
                            let name = self.tok(name_idx)?;
                            if name.kind != TokenKind::Ident {
                                return Err(self.error(name_idx, "expected field name"));
                            }
                            names.push(self.text(name).to_string());
                            k = self.skip_ws(name_idx + 1);
                        }
                        k
                    }
                    None
                    | Some(
                        TokenKind::Punct('.' | ';' | '}')
                        | TokenKind::Newline
                        | TokenKind::String
                        | TokenKind::RawString
                        | TokenKind::LineComment
                        | TokenKind::BlockComment,
                    ) => i,
                    Some(TokenKind::Punct('['))
                        if self.matching(n).is_ok_and(|close| self.ends_field(close + 1)) =>
                    {
                        i
                    }
                    Some(_) => {
                        names.push(self.text(t).to_string());
                        n
                    }
                }
            }
            TokenKind::Punct('*') => i,
            _ => {
                return Err(self.error(
                    i,
                    format!("unexpected {:?} in struct fields", self.text(t)),
                ))
            }
        };

        let (ty, mut next) = self.parse_type(type_start)?;
        let mut tag = None;
        let m = self.skip_ws(next);
        if let Some(t) = self.tokens.get(m) {
            if matches!(t.kind, TokenKind::String | TokenKind::RawString) {
                tag = Some(self.text(*t).to_string());
                next = m + 1;
            }
        }

        Ok((
            FieldNode {
                names,
                ty,
                tag,
                decs: Decorations::default(),
            },
            next,
        ))
    }

    /// Source text from the token at `start` to the one before `next`.
    fn raw(&self, start: usize, next: usize) -> Arc<str> {
        let begin = self.tokens[start].start;
        let end = self.tokens[next - 1].end;
        Arc::from(&self.source[begin..end])
    }

    /// Whether nothing but a tag or a comment follows `i` on the field's line.
    fn ends_field(&self, i: usize) -> bool {
        self.tokens.get(self.skip_ws(i)).is_none_or(|t| {
            matches!(
                t.kind,
                TokenKind::Punct(';' | '}')
                    | TokenKind::Newline
                    | TokenKind::String
                    | TokenKind::RawString
                    | TokenKind::LineComment
                    | TokenKind::BlockComment
            )
        })
    }

    fn starts_type(&self, i: usize) -> bool {
        self.tokens.get(i).is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::Ident | TokenKind::Arrow | TokenKind::Punct('*' | '[' | '(')
            )
        })
    }

    fn parse_type(&self, k: usize) -> Result<(TypeExpr, usize)> {
        let t = self.tok(k)?;
        match t.kind {
            TokenKind::Punct('*') => {
                let (inner, next) = self.parse_type(self.skip_ws(k + 1))?;
                Ok((TypeExpr::Pointer(Box::new(inner)), next))
            }
            TokenKind::Punct('[') => {
                let j = self.skip_ws(k + 1);
                if self.tok(j)?.is_punct(']') {
                    let (elem, next) = self.parse_type(self.skip_ws(j + 1))?;
                    return Ok((TypeExpr::Slice(Box::new(elem)), next));
                }
                let close = self.matching(k)?;
                let len = self.source[t.end..self.tokens[close].start].trim().to_string();
                let (elem, next) = self.parse_type(self.skip_ws(close + 1))?;
                Ok((
                    TypeExpr::Array {
                        len,
                        elem: Box::new(elem),
                    },
                    next,
                ))
            }
            TokenKind::Punct('(') => {
                let close = self.matching(k)?;
                Ok((TypeExpr::Opaque(self.raw(k, close + 1)), close + 1))
            }
            TokenKind::Arrow => {
                let j = self.skip_ws(k + 1);
                if !self.tok(j)?.is_ident(self.source, "chan") {
                    return Err(self.error(j, "expected chan"));
                }
                let (_, next) = self.parse_type(self.skip_ws(j + 1))?;
                Ok((TypeExpr::Opaque(self.raw(k, next)), next))
            }
            TokenKind::Ident => self.parse_named_type(k),
            _ => Err(self.error(k, format!("expected type, found {:?}", self.text(t)))),
        }
    }

    fn parse_named_type(&self, k: usize) -> Result<(TypeExpr, usize)> {
        let t = self.tokens[k];
        let word = self.text(t);
        let j = self.skip_ws(k + 1);
        let next_tok = self.tokens.get(j).copied();
        let followed_by = |c: char| next_tok.is_some_and(|n| n.is_punct(c));

        match word {
            "map" if followed_by('[') => {
                let close = self.matching(j)?;
                let key_start = self.skip_ws(j + 1);
                let key = match self.parse_type(key_start) {
                    Ok((key, after)) if self.skip_ws(after) == close => key,
                    _ => TypeExpr::Opaque(self.raw(key_start, close)),
                };
                let (value, next) = self.parse_type(self.skip_ws(close + 1))?;
                Ok((
                    TypeExpr::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    },
                    next,
                ))
            }
            "struct" | "interface" if followed_by('{') => {
                let close = self.matching(j)?;
                let raw = self.raw(k, close + 1);
                let ty = if word == "struct" {
                    TypeExpr::Struct(raw)
                } else {
                    TypeExpr::Interface(raw)
                };
                Ok((ty, close + 1))
            }
            "chan" => {
                let mut m = j;
                if self.tok(m)?.kind == TokenKind::Arrow {
                    m = self.skip_ws(m + 1);
                }
                let (_, next) = self.parse_type(m)?;
                Ok((TypeExpr::Opaque(self.raw(k, next)), next))
            }
            "func" if followed_by('(') => {
                let mut next = self.matching(j)? + 1;
                let m = self.skip_ws(next);
                if self.tokens.get(m).is_some_and(|t| t.is_punct('(')) {
                    next = self.matching(m)? + 1;
                } else if self.starts_type(m) {
                    next = self.parse_type(m)?.1;
                }
                Ok((TypeExpr::Opaque(self.raw(k, next)), next))
            }
            _ => {
                let mut ty = TypeExpr::Ident(word.to_string());
                let mut next = k + 1;
                if followed_by('.') {
                    let s = self.skip_ws(j + 1);
                    let sel = self.tok(s)?;
                    if sel.kind != TokenKind::Ident {
                        return Err(self.error(s, "expected selector after '.'"));
                    }
                    ty = TypeExpr::Qualified {
                        package: word.to_string(),
                        name: self.text(sel).to_string(),
                    };
                    next = s + 1;
                }
                let g = self.skip_ws(next);
                if self.tokens.get(g).is_some_and(|t| t.is_punct('[')) {
                    let close = self.matching(g)?;
                    return Ok((TypeExpr::Opaque(self.raw(k, close + 1)), close + 1));
                }
                Ok((ty, next))
            }
        }
    }
}

fn spacing(newlines: usize, after_field: bool) -> Spacing {
    if after_field && newlines >= 2 {
        Spacing::EmptyLine
    } else {
        Spacing::NewLine
    }
}
