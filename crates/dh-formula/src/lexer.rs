//! Formula lexer.
//!
//! The token stream recognizes numbers, dice terms (with keep/drop
//! suffixes), attribute tokens in both explicit (`@name`, `@{spaced
//! name}`) and implicit (bare Latin or Cyrillic word) form, and the four
//! arithmetic operators. Locale decimal commas are normalized to periods
//! before lexing, and underscores act as invisible separators so
//! natural-language formulas like `Мастерство_d6+3` tokenize cleanly.

use logos::Logos;

use crate::ast::Keep;

/// A formula token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal.
    Number(f64),
    /// A dice term such as `2d6`, `d12`, or `4d6kh3`. The count is absent
    /// for bare `dN` terms (an adjacent token or number supplies it).
    Dice {
        /// Number of dice, when written in the literal.
        count: Option<u32>,
        /// Sides per die.
        sides: u32,
        /// Keep/drop suffix, if any.
        keep: Option<Keep>,
    },
    /// An attribute token (explicit or implicit form).
    Word(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `(`
    LParen,
    /// `)`
    RParen,
}

/// Internal logos token; converted to the owned [`Token`] after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n_]+")]
enum RawToken {
    #[regex(r"[0-9]*[dD][0-9]+((kh|kl|dh|dl)[0-9]*)?", priority = 10)]
    Dice,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"@\{[^}]*\}")]
    AtBraced,

    #[regex(r"@[A-Za-z0-9А-Яа-яЁё_.]+")]
    AtWord,

    #[regex(r"[A-Za-zА-Яа-яЁё][A-Za-z0-9А-Яа-яЁё]*")]
    Word,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}

/// Lex a formula into tokens. Returns `None` on any unrecognized input;
/// the evaluator maps that to 0.
pub fn lex(source: &str) -> Option<Vec<Token>> {
    let normalized = source.replace(',', ".");
    let mut lexer = RawToken::lexer(&normalized);
    let mut tokens = Vec::new();

    while let Some(raw) = lexer.next() {
        let slice = lexer.slice();
        let token = match raw.ok()? {
            RawToken::Dice => parse_dice(slice)?,
            RawToken::Number => Token::Number(slice.parse().ok()?),
            RawToken::AtBraced => {
                Token::Word(slice[2..slice.len() - 1].trim().to_string())
            }
            RawToken::AtWord => Token::Word(slice[1..].to_string()),
            RawToken::Word => Token::Word(slice.to_string()),
            RawToken::Plus => Token::Plus,
            RawToken::Minus => Token::Minus,
            RawToken::Star => Token::Star,
            RawToken::Slash => Token::Slash,
            RawToken::LParen => Token::LParen,
            RawToken::RParen => Token::RParen,
        };
        tokens.push(token);
    }

    Some(tokens)
}

/// Parse a dice literal like `2d6`, `d12`, or `4d6kh3`.
fn parse_dice(slice: &str) -> Option<Token> {
    let lower = slice.to_lowercase();
    let d_pos = lower.find('d')?;
    let count_text = &lower[..d_pos];
    let rest = &lower[d_pos + 1..];

    let suffix_pos = ["kh", "kl", "dh", "dl"]
        .iter()
        .filter_map(|s| rest.find(s))
        .min();

    let (sides_text, keep) = match suffix_pos {
        Some(pos) => {
            let suffix = &rest[pos..];
            let n: u32 = suffix[2..].parse().unwrap_or(1);
            let keep = match &suffix[..2] {
                "kh" => Keep::Highest(n),
                "kl" => Keep::Lowest(n),
                "dh" => Keep::DropHighest(n),
                _ => Keep::DropLowest(n),
            };
            (&rest[..pos], Some(keep))
        }
        None => (rest, None),
    };

    let count = if count_text.is_empty() {
        None
    } else {
        Some(count_text.parse().ok()?)
    };

    Some(Token::Dice {
        count,
        sides: sides_text.parse().ok()?,
        keep,
    })
}
