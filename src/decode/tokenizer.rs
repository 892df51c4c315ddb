use std::fmt;

use memchr::memchr;
use smol_str::SmolStr;

use crate::error::{Error, Location};
use crate::limits;
use crate::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Class,
    Identifier,
    Str,
    Number,
    True,
    False,
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Equals,
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Class => "CLASS",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Str => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Null => "NULL",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Equals => "EQUALS",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// One lexical token. `lexeme` is the decoded content for strings and the
/// raw source slice for everything else; numbers in particular keep their
/// unparsed decimal text.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub lexeme: SmolStr,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn location(&self) -> Location {
        Location {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }
}

/// Tokenizes a complete input. On success the returned sequence always
/// ends with an [`TokenKind::Eof`] token.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let max_bytes = limits::max_input_bytes();
    if input.len() > max_bytes {
        return Err(Error::syntax_at(
            format!(
                "input of {} bytes exceeds the {} byte limit",
                input.len(),
                max_bytes
            ),
            Location {
                offset: 0,
                line: 1,
                column: 1,
            },
        ));
    }

    let mut tokenizer = Tokenizer {
        input,
        offset: 0,
        line: 1,
        column: 1,
        tokens: Vec::new(),
    };
    tokenizer.run()?;
    Ok(tokenizer.tokens)
}

struct Tokenizer<'a> {
    input: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn run(&mut self) -> Result<(), Error> {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '\n' => {
                    let (offset, line, column) = self.mark();
                    self.bump();
                    self.push(TokenKind::Newline, SmolStr::new_static("\n"), offset, line, column)?;
                }
                '#' => self.skip_comment(),
                '(' => self.punct(TokenKind::LParen, "(")?,
                ')' => self.punct(TokenKind::RParen, ")")?,
                '[' => self.punct(TokenKind::LBracket, "[")?,
                ']' => self.punct(TokenKind::RBracket, "]")?,
                '{' => self.punct(TokenKind::LBrace, "{")?,
                '}' => self.punct(TokenKind::RBrace, "}")?,
                ',' => self.punct(TokenKind::Comma, ",")?,
                ':' => self.punct(TokenKind::Colon, ":")?,
                ';' => self.punct(TokenKind::Semicolon, ";")?,
                '=' => self.punct(TokenKind::Equals, "=")?,
                '"' => self.scan_string()?,
                '-' | '0'..='9' => self.scan_number()?,
                ch if text::is_ident_start(ch) => self.scan_identifier()?,
                ch => {
                    return Err(Error::syntax_at(
                        format!("unexpected character {ch:?}"),
                        self.location(),
                    ));
                }
            }
        }

        let (offset, line, column) = self.mark();
        self.push(TokenKind::Eof, SmolStr::new_static(""), offset, line, column)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.offset, self.line, self.column)
    }

    fn location(&self) -> Location {
        Location {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn push(
        &mut self,
        kind: TokenKind,
        lexeme: SmolStr,
        offset: usize,
        line: usize,
        column: usize,
    ) -> Result<(), Error> {
        if self.tokens.len() >= limits::max_tokens() {
            return Err(Error::syntax_at("too many tokens", self.location()));
        }
        self.tokens.push(Token {
            kind,
            lexeme,
            offset,
            line,
            column,
        });
        Ok(())
    }

    fn punct(&mut self, kind: TokenKind, lexeme: &'static str) -> Result<(), Error> {
        let (offset, line, column) = self.mark();
        self.bump();
        self.push(kind, SmolStr::new_static(lexeme), offset, line, column)
    }

    /// `#` comments extend to the next line feed, exclusive. The newline
    /// itself stays significant and is tokenized by the main loop.
    fn skip_comment(&mut self) {
        self.bump();
        let rest = &self.input.as_bytes()[self.offset..];
        let end = memchr(b'\n', rest).unwrap_or(rest.len());
        let body = &self.input[self.offset..self.offset + end];
        self.column += body.chars().count();
        self.offset += end;
    }

    fn scan_string(&mut self) -> Result<(), Error> {
        let (offset, line, column) = self.mark();
        self.bump();

        let mut value = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(Error::syntax_at("unterminated string", self.location()));
            };
            match ch {
                '"' => {
                    self.bump();
                    break;
                }
                '\\' => {
                    self.bump();
                    let Some(escape) = self.bump() else {
                        return Err(Error::syntax_at(
                            "unexpected end of input in string",
                            self.location(),
                        ));
                    };
                    match escape {
                        '"' | '\\' | '/' => value.push(escape),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'u' => value.push(self.scan_unicode_escape()?),
                        // Non-standard escapes pass the escaped rune through.
                        other => value.push(other),
                    }
                }
                _ => {
                    self.bump();
                    value.push(ch);
                }
            }
        }

        self.push(TokenKind::Str, SmolStr::new(value), offset, line, column)
    }

    /// `\uXXXX`, with mandatory pairing when `XXXX` lands in the surrogate
    /// range: a high surrogate must be immediately followed by `\uYYYY`
    /// holding a low surrogate, and lone halves of either kind are errors.
    fn scan_unicode_escape(&mut self) -> Result<char, Error> {
        let high = self.scan_hex4()?;
        if (0xDC00..=0xDFFF).contains(&high) {
            return Err(Error::syntax_at("invalid unicode escape", self.location()));
        }
        if (0xD800..=0xDBFF).contains(&high) {
            if !self.input[self.offset..].starts_with("\\u") {
                return Err(Error::syntax_at("invalid unicode escape", self.location()));
            }
            self.bump();
            self.bump();
            let low = self.scan_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(Error::syntax_at("invalid unicode escape", self.location()));
            }
            let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(combined)
                .ok_or_else(|| Error::syntax_at("invalid unicode escape", self.location()));
        }
        char::from_u32(high)
            .ok_or_else(|| Error::syntax_at("invalid unicode escape", self.location()))
    }

    fn scan_hex4(&mut self) -> Result<u32, Error> {
        let bytes = self.input.as_bytes();
        if self.offset + 4 > bytes.len()
            || !bytes[self.offset..self.offset + 4]
                .iter()
                .all(u8::is_ascii_hexdigit)
        {
            return Err(Error::syntax_at("invalid unicode escape", self.location()));
        }
        let hex = &self.input[self.offset..self.offset + 4];
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| Error::syntax_at("invalid unicode escape", self.location()))?;
        self.offset += 4;
        self.column += 4;
        Ok(code)
    }

    /// JSON number grammar: `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`.
    fn scan_number(&mut self) -> Result<(), Error> {
        let (start, line, column) = self.mark();
        let bytes = self.input.as_bytes();
        let mut i = start;

        let invalid = move || {
            Error::syntax_at(
                "invalid number",
                Location {
                    offset: start,
                    line,
                    column,
                },
            )
        };

        if bytes.get(i) == Some(&b'-') {
            i += 1;
        }
        match bytes.get(i) {
            Some(b'0') => i += 1,
            Some(b'1'..=b'9') => {
                i += 1;
                while matches!(bytes.get(i), Some(b'0'..=b'9')) {
                    i += 1;
                }
            }
            _ => return Err(invalid()),
        }

        if bytes.get(i) == Some(&b'.') {
            i += 1;
            if !matches!(bytes.get(i), Some(b'0'..=b'9')) {
                return Err(invalid());
            }
            while matches!(bytes.get(i), Some(b'0'..=b'9')) {
                i += 1;
            }
        }

        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            i += 1;
            if matches!(bytes.get(i), Some(b'+' | b'-')) {
                i += 1;
            }
            if !matches!(bytes.get(i), Some(b'0'..=b'9')) {
                return Err(invalid());
            }
            while matches!(bytes.get(i), Some(b'0'..=b'9')) {
                i += 1;
            }
        }

        let lexeme = SmolStr::new(&self.input[start..i]);
        self.column += i - start;
        self.offset = i;
        self.push(TokenKind::Number, lexeme, start, line, column)
    }

    fn scan_identifier(&mut self) -> Result<(), Error> {
        let (start, line, column) = self.mark();
        while let Some(ch) = self.peek() {
            if !text::is_ident_continue(ch) {
                break;
            }
            self.bump();
        }
        let lexeme = &self.input[start..self.offset];
        let kind = match lexeme {
            "class" => TokenKind::Class,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier,
        };
        self.push(kind, SmolStr::new(lexeme), start, line, column)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().iter().map(|t| t.kind).collect()
    }

    fn single_lexeme(input: &str) -> SmolStr {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 2, "expected one token plus EOF");
        tokens[0].lexeme.clone()
    }

    #[test]
    fn covers_every_token_kind() {
        let input = "class A: a,b\na=1;\n{a:1,b:[true,false,null],c:(x)}\n# comment\nA(1.25e+2,\"s\")\n";
        let seen = kinds(input);
        for kind in [
            TokenKind::Class,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Comma,
            TokenKind::Newline,
            TokenKind::Equals,
            TokenKind::Semicolon,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            TokenKind::Number,
            TokenKind::Str,
            TokenKind::Eof,
        ] {
            assert!(seen.contains(&kind), "missing {kind}");
        }
    }

    #[test]
    fn ends_with_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(
            kinds("true"),
            vec![TokenKind::True, TokenKind::Eof]
        );
    }

    #[test]
    fn newlines_are_tokens_other_whitespace_is_not() {
        assert_eq!(
            kinds(" \t\r1\n2"),
            vec![
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let tokens = tokenize("1 # trailing ключ\n2").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[2].line, 2);
    }

    #[rstest]
    #[case(r#""hello""#, "hello")]
    #[case(r#""a\"b""#, "a\"b")]
    #[case(r#""a\\b""#, "a\\b")]
    #[case(r#""a\/b""#, "a/b")]
    #[case(r#""\b\f\n\r\t""#, "\u{8}\u{c}\n\r\t")]
    #[case(r#""A""#, "A")]
    #[case(r#""😀""#, "😀")]
    #[case(r#""\uD83D\uDE00""#, "😀")]
    #[case(r#""\u12345""#, "\u{1234}5")]
    #[case(r#""\q""#, "q")]
    fn string_escapes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(single_lexeme(input), expected);
    }

    #[rstest]
    #[case(r#""\u12G4""#)]
    #[case(r#""\uD83D""#)]
    #[case(r#""\uDE00""#)]
    #[case(r#""\uD83DA""#)]
    #[case(r#""\uD83D\uD83D""#)]
    #[case(r#""\uDE00\uDE00""#)]
    #[case(r#""\u""#)]
    #[case(r#""\u123""#)]
    #[case(r#""\uD83D\uDE0""#)]
    #[case("\"unterminated")]
    #[case("\"trailing backslash\\")]
    fn invalid_strings(#[case] input: &str) {
        assert!(tokenize(input).is_err(), "accepted {input:?}");
    }

    #[rstest]
    #[case("0")]
    #[case("-0")]
    #[case("1")]
    #[case("-1")]
    #[case("10")]
    #[case("0.1")]
    #[case("1.0")]
    #[case("-1.25")]
    #[case("1e0")]
    #[case("1E0")]
    #[case("1e+9")]
    #[case("1e-9")]
    #[case("-1E-9")]
    fn valid_numbers(#[case] input: &str) {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, input);
    }

    #[rstest]
    #[case("-")]
    #[case("1.")]
    #[case("1e")]
    #[case("1e+")]
    #[case("-.1")]
    #[case("1.e3")]
    fn invalid_numbers(#[case] input: &str) {
        assert!(tokenize(input).is_err(), "accepted {input:?}");
    }

    #[test]
    fn unicode_identifiers() {
        let tokens = tokenize("ключ 名前 _x a1").unwrap();
        let idents: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(idents, vec!["ключ", "名前", "_x", "a1"]);
    }

    #[test]
    fn keywords_become_their_own_kinds() {
        assert_eq!(
            kinds("class true false null classy"),
            vec![
                TokenKind::Class,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn offsets_count_bytes_columns_count_code_points() {
        // "ключ" is 8 bytes but 4 code points.
        let tokens = tokenize("ключ: 1").unwrap();
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[1].kind, TokenKind::Colon);
        assert_eq!(tokens[1].offset, 8);
        assert_eq!(tokens[1].column, 5);
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].offset, 10);
        assert_eq!(tokens[2].column, 7);
    }

    #[test]
    fn unexpected_character_reports_location() {
        let err = tokenize("  @").unwrap_err();
        assert!(err.to_string().contains("unexpected character"));
        assert_eq!(err.location().map(|l| l.offset), Some(2));
    }
}
