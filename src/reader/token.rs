//! Module for extracting tokens from source text.

use std::fmt;

use super::{LexResult, LexicalError};

/// Syntax class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntaxClass {
    Main,
    Int,
    Double,
    Char,
    If,
    Else,
    For,
    While,
    Void,
    Return,

    Identifier,
    Number,

    Assign,
    Plus,
    Minus,
    Times,
    Divide,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Colon,
    Comma,
    Semicolon,

    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl SyntaxClass {
    /// Look up a reserved word.
    pub fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "main" => SyntaxClass::Main,
            "int" => SyntaxClass::Int,
            "double" => SyntaxClass::Double,
            "char" => SyntaxClass::Char,
            "if" => SyntaxClass::If,
            "else" => SyntaxClass::Else,
            "for" => SyntaxClass::For,
            "while" => SyntaxClass::While,
            "void" => SyntaxClass::Void,
            "return" => SyntaxClass::Return,
            _ => return None,
        })
    }

    /// The fixed spelling of this class, if it has one.
    /// Identifiers and numbers don't.
    pub fn lexeme(self) -> Option<&'static str> {
        use SyntaxClass::*;
        Some(match self {
            Main => "main",
            Int => "int",
            Double => "double",
            Char => "char",
            If => "if",
            Else => "else",
            For => "for",
            While => "while",
            Void => "void",
            Return => "return",
            Identifier | Number => return None,
            Assign => "=",
            Plus => "+",
            Minus => "-",
            Times => "*",
            Divide => "/",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
            LBrace => "{",
            RBrace => "}",
            Colon => ":",
            Comma => ",",
            Semicolon => ";",
            Lt => "<",
            Le => "<=",
            Eq => "==",
            Ne => "!=",
            Ge => ">=",
            Gt => ">",
        })
    }
}

impl fmt::Display for SyntaxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.lexeme()) {
            (_, Some(lexeme)) => write!(f, "'{lexeme}'"),
            (SyntaxClass::Number, None) => write!(f, "number"),
            (_, None) => write!(f, "identifier"),
        }
    }
}

/// A token along with its starting position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub class: SyntaxClass,
    pub line: usize,
    pub column: usize,
}

/// Split the input into its constituent tokens.
pub fn tokenize(mut input: &str) -> LexResult<Vec<Token>> {
    let mut result = Vec::new();

    // Positions are 1-indexed.
    let mut line = 1;
    let mut column = 1;
    while !input.is_empty() {
        let next = get_next_token(input, line, column)?;
        let consumed = &input[..input.len() - next.remainder.len()];

        match next.class {
            Some(class) => {
                result.push(Token {
                    value: consumed.to_owned(),
                    class,
                    line,
                    column,
                });
                column += consumed.chars().count();
            }
            None => {
                for ch in consumed.chars() {
                    match ch {
                        ' ' => column += 1,
                        '\t' => column += 4,
                        '\n' => {
                            line += 1;
                            column = 1;
                        }
                        // Carriage returns don't move the cursor.
                        _ => (),
                    }
                }
            }
        }

        input = next.remainder;
    }

    tracing::trace!("tokenized {} tokens over {} lines", result.len(), line);
    Ok(result)
}

struct NextToken<'a> {
    // Class of the token retrieved, if any.
    // None if only blanks were consumed.
    class: Option<SyntaxClass>,

    // Remaining input.
    remainder: &'a str,
}

mod regex {
    use regex::Regex;
    use std::sync::OnceLock;

    pub(super) fn blank() -> &'static Regex {
        static BLANK: OnceLock<Regex> = OnceLock::new();
        BLANK.get_or_init(|| {
            Regex::new(r"\A[ \t\r\n]+").expect("could not compile regex for blanks")
        })
    }

    pub(super) fn word() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[A-Za-z_][A-Za-z_0-9]*").expect("could not compile regex for word")
        })
    }

    pub(super) fn number() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[0-9]+(?:[.][0-9]*)?").expect("could not compile regex for number")
        })
    }
}

/// Get the next token from the input, and return the remainder of the input.
/// `line` and `column` are the position of the start of `input`, for errors.
fn get_next_token(input: &str, line: usize, column: usize) -> LexResult<NextToken<'_>> {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return Ok(NextToken {
            class: None,
            remainder: input,
        });
    };
    let second = chars.next();

    // Operators and punctuation: one character, or two with a trailing '='.
    let fixed = match (first, second) {
        ('+', _) => Some((SyntaxClass::Plus, 1)),
        ('-', _) => Some((SyntaxClass::Minus, 1)),
        ('*', _) => Some((SyntaxClass::Times, 1)),
        ('/', _) => Some((SyntaxClass::Divide, 1)),
        ('(', _) => Some((SyntaxClass::LParen, 1)),
        (')', _) => Some((SyntaxClass::RParen, 1)),
        ('[', _) => Some((SyntaxClass::LBracket, 1)),
        (']', _) => Some((SyntaxClass::RBracket, 1)),
        ('{', _) => Some((SyntaxClass::LBrace, 1)),
        ('}', _) => Some((SyntaxClass::RBrace, 1)),
        (':', _) => Some((SyntaxClass::Colon, 1)),
        (',', _) => Some((SyntaxClass::Comma, 1)),
        (';', _) => Some((SyntaxClass::Semicolon, 1)),
        ('>', Some('=')) => Some((SyntaxClass::Ge, 2)),
        ('>', _) => Some((SyntaxClass::Gt, 1)),
        ('<', Some('=')) => Some((SyntaxClass::Le, 2)),
        ('<', _) => Some((SyntaxClass::Lt, 1)),
        ('=', Some('=')) => Some((SyntaxClass::Eq, 2)),
        ('=', _) => Some((SyntaxClass::Assign, 1)),
        ('!', Some('=')) => Some((SyntaxClass::Ne, 2)),
        _ => None,
    };
    if let Some((class, len)) = fixed {
        return Ok(NextToken {
            class: Some(class),
            remainder: &input[len..],
        });
    }

    if let Some(blank) = regex::blank().find(input) {
        return Ok(NextToken {
            class: None,
            remainder: &input[blank.end()..],
        });
    }

    if let Some(word) = regex::word().find(input) {
        let class = SyntaxClass::keyword(word.as_str()).unwrap_or(SyntaxClass::Identifier);
        return Ok(NextToken {
            class: Some(class),
            remainder: &input[word.end()..],
        });
    }

    if let Some(number) = regex::number().find(input) {
        let remainder = &input[number.end()..];
        // Only one decimal point is allowed; a second one right after the run is an error.
        if remainder.starts_with('.') {
            let text = &input[..=number.end()];
            return Err(LexicalError::MalformedNumber {
                text: text.to_owned(),
                line,
                column: column + number.as_str().chars().count(),
            });
        }
        return Ok(NextToken {
            class: Some(SyntaxClass::Number),
            remainder,
        });
    }

    Err(LexicalError::UnexpectedCharacter {
        found: first,
        line,
        column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(input: &str) -> Vec<SyntaxClass> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.class)
            .collect()
    }

    #[test]
    fn recognize_words() {
        for word in ["x", "_tmp", "a1", "Main", "while_", "i_2_j"] {
            let r = regex::word();
            let found = r.find(word).map(|m| m.as_str());
            assert_eq!(found, Some(word), "did not match word {word:?}");
        }
    }

    #[test]
    fn tokenize_keywords() {
        let output = classes("main if else while for int double char void return mainly");
        let want = &[
            SyntaxClass::Main,
            SyntaxClass::If,
            SyntaxClass::Else,
            SyntaxClass::While,
            SyntaxClass::For,
            SyntaxClass::Int,
            SyntaxClass::Double,
            SyntaxClass::Char,
            SyntaxClass::Void,
            SyntaxClass::Return,
            SyntaxClass::Identifier,
        ];
        assert_eq!(&output, want);
    }

    #[test]
    fn tokenize_operators() {
        let output = classes("+-*/()[]{}:,; < <= == != >= > = ");
        let want = &[
            SyntaxClass::Plus,
            SyntaxClass::Minus,
            SyntaxClass::Times,
            SyntaxClass::Divide,
            SyntaxClass::LParen,
            SyntaxClass::RParen,
            SyntaxClass::LBracket,
            SyntaxClass::RBracket,
            SyntaxClass::LBrace,
            SyntaxClass::RBrace,
            SyntaxClass::Colon,
            SyntaxClass::Comma,
            SyntaxClass::Semicolon,
            SyntaxClass::Lt,
            SyntaxClass::Le,
            SyntaxClass::Eq,
            SyntaxClass::Ne,
            SyntaxClass::Ge,
            SyntaxClass::Gt,
            SyntaxClass::Assign,
        ];
        assert_eq!(&output, want);
    }

    #[test]
    fn compound_operators_without_spaces() {
        let tokens = tokenize("a<=b==c").unwrap();
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["a", "<=", "b", "==", "c"]);
        assert_eq!(tokens[3].column, 5);
    }

    #[test]
    fn tokenize_numbers() {
        let tokens = tokenize("12 3.25 7. 08x").unwrap();
        let values: Vec<(&str, SyntaxClass)> = tokens
            .iter()
            .map(|t| (t.value.as_str(), t.class))
            .collect();
        assert_eq!(
            values,
            [
                ("12", SyntaxClass::Number),
                ("3.25", SyntaxClass::Number),
                ("7.", SyntaxClass::Number),
                ("08", SyntaxClass::Number),
                ("x", SyntaxClass::Identifier),
            ]
        );
    }

    #[test]
    fn positions_track_blanks() {
        // Tabs are four columns, newlines reset the column, carriage returns are invisible.
        let input = "main\t(\r\n  x =\t1;\n}";
        let tokens = tokenize(input).unwrap();
        let positions: Vec<(&str, usize, usize)> = tokens
            .iter()
            .map(|t| (t.value.as_str(), t.line, t.column))
            .collect();
        assert_eq!(
            positions,
            [
                ("main", 1, 1),
                ("(", 1, 9),
                ("x", 2, 3),
                ("=", 2, 5),
                ("1", 2, 10),
                (";", 2, 11),
                ("}", 3, 1),
            ]
        );
    }

    #[test]
    fn error_on_second_decimal_point() {
        match tokenize("main(){x=1.2.3;}") {
            Err(LexicalError::MalformedNumber { text, line, column }) => {
                assert_eq!(text, "1.2.");
                assert_eq!((line, column), (1, 13));
            }
            v => panic!("unexpected result: {v:?}"),
        }
    }

    #[test]
    fn error_on_bare_bang() {
        let err = tokenize("main(){\n  if(!a)").unwrap_err();
        assert_eq!(
            err,
            LexicalError::UnexpectedCharacter {
                found: '!',
                line: 2,
                column: 6
            }
        );
    }

    #[test]
    fn error_on_unknown_character() {
        let err = tokenize("x = 1 # 2").unwrap_err();
        assert_eq!(err.position(), (1, 7));
        assert!(
            err.to_string().contains("'#'"),
            "missing character in error string: {err}"
        );
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize(" \t\r\n ").unwrap().is_empty());
    }
}
