use crate::position::Span;
use crate::template::{Document, ErrorKind, Node, TemplateError, VarName, is_identifier_char};

/// What a `${...}` block turned out to be.
enum Block {
    Var(VarName),
    Open(VarName),
    Else(Span),
    End(Span),
}

/// Why a node sequence stopped.
enum Terminator {
    Eof,
    Else(Span),
    End(Span),
}

/// Conditionals may nest at most this deep.
pub const MAX_NESTING: usize = 64;

struct Cursor<'a> {
    source: &'a str,
    offset: usize,
    /// Number of conditionals currently open.
    depth: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.offset += 1;
        }
    }

    /// Consume a run of identifier characters, possibly empty.
    fn identifier(&mut self) -> Span {
        let start = self.offset;
        while self.peek().is_some_and(is_identifier_char) {
            self.offset += 1;
        }
        Span::new(start, self.offset)
    }

    fn slice(&self, span: Span) -> &'a str {
        &self.source[span.start..span.end]
    }

    fn here(&self) -> Span {
        Span::at(self.offset)
    }

    fn error(&self, kind: ErrorKind, span: Span) -> TemplateError {
        TemplateError::new(kind, self.source, span)
    }

    fn error_at_end(&self, kind: ErrorKind) -> TemplateError {
        self.error(kind, Span::last_char(self.source))
    }
}

/// Parse a template into a [`Document`].
///
/// # Errors
///
/// Returns the first `TemplateError` found; no partial document is produced.
pub fn parse(source: &str) -> Result<Document, TemplateError> {
    let mut cursor = Cursor {
        source,
        offset: 0,
        depth: 0,
    };
    let (nodes, terminator) = sequence(&mut cursor)?;
    match terminator {
        Terminator::Eof => Ok(Document { nodes }),
        Terminator::Else(span) => Err(cursor.error(ErrorKind::UnexpectedElse, span)),
        Terminator::End(span) => Err(cursor.error(ErrorKind::UnexpectedEnd, span)),
    }
}

/// Parse nodes until end of input or an `${else}`/`${end}` at this depth.
fn sequence(cursor: &mut Cursor<'_>) -> Result<(Vec<Node>, Terminator), TemplateError> {
    let mut nodes = Vec::new();
    let mut literal = String::new();

    let terminator = loop {
        let Some(c) = cursor.bump() else {
            break Terminator::Eof;
        };
        if c != '$' {
            literal.push(c);
            continue;
        }
        match cursor.peek() {
            Some('$') => {
                cursor.bump();
                literal.push('$');
            }
            Some('{') => {
                let start = cursor.offset - 1;
                cursor.bump();
                if !literal.is_empty() {
                    nodes.push(Node::Literal(std::mem::take(&mut literal)));
                }
                match block(cursor)? {
                    Block::Var(name) => nodes.push(Node::Var(name)),
                    Block::Open(_) if cursor.depth >= MAX_NESTING => {
                        let span = Span::new(start, cursor.offset);
                        return Err(cursor.error(ErrorKind::TooDeep, span));
                    }
                    Block::Open(name) => nodes.push(conditional(cursor, name)?),
                    Block::Else(span) => break Terminator::Else(span),
                    Block::End(span) => break Terminator::End(span),
                }
            }
            _ => return Err(cursor.error(ErrorKind::BareDollar, cursor.here())),
        }
    };

    if !literal.is_empty() {
        nodes.push(Node::Literal(literal));
    }
    Ok((nodes, terminator))
}

/// Parse the inside of a `${...}` block; the cursor sits right after `${`.
fn block(cursor: &mut Cursor<'_>) -> Result<Block, TemplateError> {
    cursor.skip_whitespace();
    let ident = cursor.identifier();
    cursor.skip_whitespace();

    let Some(c) = cursor.peek() else {
        return Err(cursor.error_at_end(ErrorKind::UnfinishedBlock));
    };
    let here = cursor.here();
    let name = cursor.slice(ident);

    match c {
        '}' | '?' if name.is_empty() => Err(cursor.error(ErrorKind::MissingVariable, here)),
        '}' => {
            cursor.bump();
            Ok(match name {
                "else" => Block::Else(ident),
                "end" => Block::End(ident),
                _ => Block::Var(VarName::from(name)),
            })
        }
        '?' => {
            cursor.bump();
            cursor.skip_whitespace();
            match cursor.peek() {
                Some('}') => {
                    cursor.bump();
                    Ok(Block::Open(VarName::from(name)))
                }
                None => Err(cursor.error_at_end(ErrorKind::UnfinishedBlock)),
                Some(c) if is_identifier_char(c) => {
                    Err(cursor.error(ErrorKind::MultipleVariables, cursor.here()))
                }
                Some(_) => Err(cursor.error(ErrorKind::UnexpectedCharacter, cursor.here())),
            }
        }
        c if is_identifier_char(c) => Err(cursor.error(ErrorKind::MultipleVariables, here)),
        _ => Err(cursor.error(ErrorKind::UnexpectedCharacter, here)),
    }
}

/// Parse the branches of a conditional whose `${name?}` has just been read.
fn conditional(cursor: &mut Cursor<'_>, name: VarName) -> Result<Node, TemplateError> {
    cursor.depth += 1;
    let (then, terminator) = sequence(cursor)?;
    let otherwise = match terminator {
        Terminator::End(_) => None,
        Terminator::Eof => return Err(cursor.error_at_end(ErrorKind::MissingEnd)),
        Terminator::Else(_) => {
            let (otherwise, terminator) = sequence(cursor)?;
            match terminator {
                Terminator::End(_) => Some(otherwise),
                Terminator::Eof => return Err(cursor.error_at_end(ErrorKind::MissingEnd)),
                Terminator::Else(span) => {
                    return Err(cursor.error(ErrorKind::TooManyElse, span));
                }
            }
        }
    };
    cursor.depth -= 1;
    Ok(Node::Conditional {
        name,
        then,
        otherwise,
    })
}
