//! Grammar building blocks.

/// A node of a statement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A literal word, matched case-insensitively on a word boundary.
    Keyword(&'static str),
    /// Literal punctuation such as `*` or `(`.
    Punct(&'static str),
    /// All children in order.
    Sequence(Vec<Element>),
    /// Any one of the children.
    Choice(Vec<Element>),
    Optional(Box<Element>),
    /// A quoted string (`'..'` or `".."`, quote doubled to escape) or a bare name.
    Name,
    /// An integer, optionally signed and suffixed with a time unit (`10`, `-3`, `1h`).
    Number,
    /// Everything up to the end of the input; needs at least one character.
    Rest,
}

/// A token the parser would accept at the reported position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Keyword(&'static str),
    Punct(&'static str),
    Name,
    Number,
    Rest,
}

impl Token {
    /// Returns the literal word when the token is a keyword.
    #[must_use]
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Token::Keyword(word) => Some(word),
            _ => None,
        }
    }
}

pub fn kw(word: &'static str) -> Element {
    Element::Keyword(word)
}

pub fn punct(text: &'static str) -> Element {
    Element::Punct(text)
}

pub fn seq(items: impl Into<Vec<Element>>) -> Element {
    Element::Sequence(items.into())
}

pub fn choice(items: impl Into<Vec<Element>>) -> Element {
    Element::Choice(items.into())
}

/// A choice between plain keywords.
pub fn keywords(words: &[&'static str]) -> Element {
    Element::Choice(words.iter().copied().map(Element::Keyword).collect())
}

pub fn opt(item: Element) -> Element {
    Element::Optional(Box::new(item))
}
