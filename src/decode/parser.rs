use std::collections::HashMap;

use smol_str::SmolStr;

use crate::decode::tokenizer::{Token, TokenKind};
use crate::error::Error;
use crate::limits;
use crate::value::{Map, Number, Value};

/// Recursive-descent parser over the token stream.
///
/// A document is a header of class definitions followed by at most one
/// value. The class table lives for one parse: definitions are recorded in
/// header order and resolved by name when a class instantiation appears in
/// the body.
pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    classes: HashMap<SmolStr, Vec<SmolStr>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            classes: HashMap::new(),
        }
    }

    /// Parses the whole document and returns its single value. An input
    /// that is empty after the header decodes as `Null`.
    pub fn parse(mut self) -> Result<Value, Error> {
        let value = self.parse_document()?;
        Ok(value)
    }

    /// Like [`Parser::parse`], but also hands back the class table.
    /// Fragment validation uses it to reject headers where a bare value is
    /// required.
    pub fn parse_with_classes(mut self) -> Result<(Value, HashMap<SmolStr, Vec<SmolStr>>), Error> {
        let value = self.parse_document()?;
        Ok((value, self.classes))
    }

    fn parse_document(&mut self) -> Result<Value, Error> {
        self.parse_header()?;
        self.skip_newlines();

        if self.current().kind == TokenKind::Eof {
            return Ok(Value::Null);
        }

        let value = if self.at_implicit_entry() {
            self.parse_implicit_object(1)?
        } else {
            self.parse_value(1)?
        };

        self.skip_newlines();
        let trailing = self.current();
        if trailing.kind != TokenKind::Eof {
            return Err(Error::syntax_at(
                format!("unexpected token {} after top-level value", trailing.kind),
                trailing.location(),
            ));
        }
        Ok(value)
    }

    fn current(&self) -> &Token {
        // The token stream always ends with EOF, so pos stays in bounds.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        let token = self.current();
        if token.kind != kind {
            return Err(Error::syntax_at(
                format!("expected {}, got {}", kind, token.kind),
                token.location(),
            ));
        }
        Ok(self.advance())
    }

    fn skip_newlines(&mut self) {
        while self.current().kind == TokenKind::Newline {
            self.advance();
        }
    }

    /// Document-root lookahead: `key ':'` opens an implicit object, where
    /// the key may be an identifier or a quoted string.
    fn at_implicit_entry(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Identifier | TokenKind::Str
        ) && self.peek(1).kind == TokenKind::Colon
    }

    fn parse_header(&mut self) -> Result<(), Error> {
        self.skip_newlines();
        while self.current().kind == TokenKind::Class {
            self.parse_class_definition()?;
            self.skip_newlines();
        }
        Ok(())
    }

    /// `class Name: key1,key2,...` terminated by a newline or EOF. An
    /// empty key list is legal; a repeated class name keeps the later
    /// definition.
    fn parse_class_definition(&mut self) -> Result<(), Error> {
        self.expect(TokenKind::Class)?;

        let name = {
            let token = self.current();
            if token.kind != TokenKind::Identifier {
                return Err(Error::syntax_at("expected class name", token.location()));
            }
            self.advance().lexeme
        };

        self.expect(TokenKind::Colon)?;

        let mut keys = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::Identifier | TokenKind::Str => {
                    keys.push(self.advance().lexeme);
                }
                _ => break,
            }
            if self.current().kind == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }

        self.classes.insert(name, keys);

        let token = self.current();
        if token.kind != TokenKind::Newline && token.kind != TokenKind::Eof {
            return Err(Error::syntax_at(
                "expected newline after class definition",
                token.location(),
            ));
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), Error> {
        if depth > limits::max_parse_depth() {
            return Err(Error::syntax_at(
                "maximum parse depth exceeded",
                self.current().location(),
            ));
        }
        Ok(())
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, Error> {
        self.check_depth(depth)?;

        let token = self.current().clone();
        match token.kind {
            TokenKind::True => {
                self.advance();
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Value::Bool(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Value::Null)
            }
            TokenKind::Number => {
                self.advance();
                Ok(Value::Number(Number::from_lexeme(token.lexeme)))
            }
            TokenKind::Str => {
                self.advance();
                Ok(Value::String(token.lexeme.to_string()))
            }
            TokenKind::LBracket => self.parse_array(depth),
            TokenKind::LBrace => self.parse_object(depth),
            TokenKind::Identifier => self.parse_class_instantiation(depth),
            kind => Err(Error::syntax_at(
                format!("unexpected token {kind}"),
                token.location(),
            )),
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, Error> {
        self.expect(TokenKind::LBracket)?;

        let mut items = Vec::new();
        if self.current().kind == TokenKind::RBracket {
            self.advance();
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.parse_value(depth + 1)?);
            if self.current().kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }

        self.expect(TokenKind::RBracket)?;
        Ok(Value::Array(items))
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, Error> {
        self.expect(TokenKind::LBrace)?;

        let mut map = Map::new();
        if self.current().kind == TokenKind::RBrace {
            self.advance();
            return Ok(Value::Object(map));
        }

        loop {
            let key = {
                let token = self.current();
                match token.kind {
                    TokenKind::Str | TokenKind::Identifier => self.advance().lexeme,
                    _ => {
                        return Err(Error::syntax_at(
                            "expected object key",
                            token.location(),
                        ));
                    }
                }
            };

            self.expect(TokenKind::Colon)?;
            let value = self.parse_value(depth + 1)?;
            // Duplicate keys: the later value wins.
            map.insert(key.to_string(), value);

            if self.current().kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Value::Object(map))
    }

    /// `Name(arg1,arg2,...)` where `Name` was defined in the header. The
    /// argument count must match the class key count exactly, and the
    /// result is an object with the class keys in definition order.
    fn parse_class_instantiation(&mut self, depth: usize) -> Result<Value, Error> {
        let name_token = self.advance();
        let name_location = name_token.location();
        let name = name_token.lexeme;

        if self.current().kind != TokenKind::LParen {
            return Err(Error::syntax_at(
                "expected ( for class instantiation",
                self.current().location(),
            ));
        }
        self.advance();

        let keys = match self.classes.get(&name) {
            Some(keys) => keys.clone(),
            None => {
                return Err(Error::syntax_at(
                    format!("undefined class: {name}"),
                    name_location,
                ));
            }
        };

        let mut args = Vec::new();
        if self.current().kind == TokenKind::RParen {
            self.advance();
        } else {
            loop {
                args.push(self.parse_value(depth + 1)?);
                if self.current().kind != TokenKind::Comma {
                    break;
                }
                self.advance();
            }
            self.expect(TokenKind::RParen)?;
        }

        if args.len() != keys.len() {
            return Err(Error::syntax_at(
                format!(
                    "class {name} expects {} arguments, got {}",
                    keys.len(),
                    args.len()
                ),
                name_location,
            ));
        }

        let mut map = Map::new();
        for (key, arg) in keys.iter().zip(args) {
            // Duplicate class keys: the later constructor slot wins.
            map.insert(key.to_string(), arg);
        }
        Ok(Value::Object(map))
    }

    /// Depth-1 `key: value` entries at the document root, without braces.
    /// Entries are separated by newlines or commas; a separator may also
    /// be omitted entirely when the next tokens already read as `key ':'`.
    fn parse_implicit_object(&mut self, depth: usize) -> Result<Value, Error> {
        self.check_depth(depth)?;

        let mut map = Map::new();
        loop {
            let key = {
                let token = self.current();
                match token.kind {
                    TokenKind::Identifier | TokenKind::Str => self.advance().lexeme,
                    _ => {
                        return Err(Error::syntax_at(
                            "expected object key",
                            token.location(),
                        ));
                    }
                }
            };

            self.expect(TokenKind::Colon)?;
            let value = self.parse_value(depth + 1)?;
            map.insert(key.to_string(), value);

            match self.current().kind {
                TokenKind::Comma => {
                    self.advance();
                    self.skip_newlines();
                }
                TokenKind::Newline => {
                    self.skip_newlines();
                    if self.current().kind == TokenKind::Eof {
                        break;
                    }
                }
                TokenKind::Eof => break,
                _ if self.at_implicit_entry() => {}
                kind => {
                    return Err(Error::syntax_at(
                        format!("unexpected token {kind} in implicit object"),
                        self.current().location(),
                    ));
                }
            }
        }

        Ok(Value::Object(map))
    }
}
