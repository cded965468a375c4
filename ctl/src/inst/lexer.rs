//! Character-level state machine for `.inst` text.
//!
//! [`transition`] is a pure function of the current state and the class of
//! the next character; [`Scanner`] drives it, collects token text, and turns
//! the resulting actions into [`Declaration`]s. Nothing here knows which
//! types or properties exist.

use crate::error::*;

pub const MAX_IDENTIFIER_LEN: usize = 128;
pub const MAX_STRING_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Space,
    Newline,
    /// ASCII letters and `_`.
    Alpha,
    Digit,
    Minus,
    Hash,
    Quote,
    Equals,
    Semicolon,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Other,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        match c {
            '\n' => CharClass::Newline,
            ' ' | '\t' | '\r' => CharClass::Space,
            'a'..='z' | 'A'..='Z' | '_' => CharClass::Alpha,
            '0'..='9' => CharClass::Digit,
            '-' => CharClass::Minus,
            '#' => CharClass::Hash,
            '"' => CharClass::Quote,
            '=' => CharClass::Equals,
            ';' => CharClass::Semicolon,
            '{' => CharClass::OpenBrace,
            '}' => CharClass::CloseBrace,
            '(' => CharClass::OpenParen,
            ')' => CharClass::CloseParen,
            '[' => CharClass::OpenBracket,
            ']' => CharClass::CloseBracket,
            _ => CharClass::Other,
        }
    }

    fn is_space(self) -> bool {
        matches!(self, CharClass::Space | CharClass::Newline)
    }

    fn is_word(self) -> bool {
        matches!(self, CharClass::Alpha | CharClass::Digit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Initial,
    Comment,
    TypeName,
    SearchInstanceName,
    InstanceName,
    SearchOpenBrace,
    SearchPropertyName,
    PropertyName,
    SearchPropertyAction,
    SearchValue,
    IntValue,
    RefId,
    SearchSemicolon,
    SearchOpenQuote,
    QuotedString,
    SearchCloseParen,
    SearchArrayIndex,
    ArrayIndex,
    SearchCloseBracket,
    SearchArrayEqual,
    SearchArrayRef,
    ArrayRef,
}

impl State {
    pub fn describe(self) -> &'static str {
        match self {
            State::Initial => "looking for a type name",
            State::Comment => "in a comment",
            State::TypeName => "reading a type name",
            State::SearchInstanceName => "looking for an instance name",
            State::InstanceName => "reading an instance name",
            State::SearchOpenBrace => "looking for '{'",
            State::SearchPropertyName => "looking for a property name",
            State::PropertyName => "reading a property name",
            State::SearchPropertyAction => "looking for '=', '(' or '['",
            State::SearchValue => "looking for a value",
            State::IntValue => "reading an integer",
            State::RefId => "reading a reference",
            State::SearchSemicolon => "looking for ';'",
            State::SearchOpenQuote => "looking for '\"'",
            State::QuotedString => "reading a quoted string",
            State::SearchCloseParen => "looking for ')'",
            State::SearchArrayIndex => "looking for an array index",
            State::ArrayIndex => "reading an array index",
            State::SearchCloseBracket => "looking for ']'",
            State::SearchArrayEqual => "looking for '='",
            State::SearchArrayRef => "looking for an array reference",
            State::ArrayRef => "reading an array reference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start a token with the current character.
    Begin,
    /// Start an empty token.
    Clear,
    /// Append the current character to the token.
    Push,
    /// Enter a comment, remembering the interrupted state.
    Suspend,
    /// Leave a comment, returning to the interrupted state.
    Resume,
    EndType,
    EndName,
    OpenBody,
    EndProperty,
    EndInt,
    EndRef,
    EndString,
    EndIndex,
    EndArrayRef,
    EndStatement,
    CloseBody,
}

pub type Step = (State, &'static [Action]);

/// The whole grammar. `None` is an unexpected character.
pub fn transition(state: State, class: CharClass) -> Option<Step> {
    use Action::*;
    use CharClass as C;
    use State as S;

    let step: Step = match (state, class) {
        (S::Comment, C::Newline) => (S::Comment, &[Resume]),
        (S::Comment, _) => (S::Comment, &[]),
        (S::QuotedString, C::Quote) => (S::SearchCloseParen, &[EndString]),
        (S::QuotedString, C::Newline) => return None,
        (S::QuotedString, _) => (S::QuotedString, &[Push]),
        (_, C::Hash) => (S::Comment, &[Suspend]),

        (S::Initial, c) if c.is_space() => (S::Initial, &[]),
        (S::Initial, C::Alpha) => (S::TypeName, &[Begin]),

        (S::TypeName, c) if c.is_word() => (S::TypeName, &[Push]),
        (S::TypeName, c) if c.is_space() => (S::SearchInstanceName, &[EndType]),

        (S::SearchInstanceName, c) if c.is_space() => (S::SearchInstanceName, &[]),
        (S::SearchInstanceName, C::Alpha) => (S::InstanceName, &[Begin]),

        (S::InstanceName, c) if c.is_word() => (S::InstanceName, &[Push]),
        (S::InstanceName, c) if c.is_space() => (S::SearchOpenBrace, &[EndName]),
        (S::InstanceName, C::OpenBrace) => (S::SearchPropertyName, &[EndName, OpenBody]),

        (S::SearchOpenBrace, c) if c.is_space() => (S::SearchOpenBrace, &[]),
        (S::SearchOpenBrace, C::OpenBrace) => (S::SearchPropertyName, &[OpenBody]),

        (S::SearchPropertyName, c) if c.is_space() => (S::SearchPropertyName, &[]),
        (S::SearchPropertyName, C::Alpha) => (S::PropertyName, &[Begin]),
        (S::SearchPropertyName, C::CloseBrace) => (S::Initial, &[CloseBody]),

        (S::PropertyName, c) if c.is_word() => (S::PropertyName, &[Push]),
        (S::PropertyName, c) if c.is_space() => (S::SearchPropertyAction, &[EndProperty]),
        (S::PropertyName, C::Equals) => (S::SearchValue, &[EndProperty]),
        (S::PropertyName, C::OpenParen) => (S::SearchOpenQuote, &[EndProperty]),
        (S::PropertyName, C::OpenBracket) => (S::SearchArrayIndex, &[EndProperty]),

        (S::SearchPropertyAction, c) if c.is_space() => (S::SearchPropertyAction, &[]),
        (S::SearchPropertyAction, C::Equals) => (S::SearchValue, &[]),
        (S::SearchPropertyAction, C::OpenParen) => (S::SearchOpenQuote, &[]),
        (S::SearchPropertyAction, C::OpenBracket) => (S::SearchArrayIndex, &[]),

        (S::SearchValue, c) if c.is_space() => (S::SearchValue, &[]),
        (S::SearchValue, C::Digit | C::Minus) => (S::IntValue, &[Begin]),
        (S::SearchValue, C::Alpha) => (S::RefId, &[Begin]),

        (S::IntValue, C::Digit) => (S::IntValue, &[Push]),
        (S::IntValue, c) if c.is_space() => (S::SearchSemicolon, &[EndInt]),
        (S::IntValue, C::Semicolon) => (S::SearchPropertyName, &[EndInt, EndStatement]),

        (S::RefId, c) if c.is_word() => (S::RefId, &[Push]),
        (S::RefId, c) if c.is_space() => (S::SearchSemicolon, &[EndRef]),
        (S::RefId, C::Semicolon) => (S::SearchPropertyName, &[EndRef, EndStatement]),

        (S::SearchSemicolon, c) if c.is_space() => (S::SearchSemicolon, &[]),
        (S::SearchSemicolon, C::Semicolon) => (S::SearchPropertyName, &[EndStatement]),

        (S::SearchOpenQuote, c) if c.is_space() => (S::SearchOpenQuote, &[]),
        (S::SearchOpenQuote, C::Quote) => (S::QuotedString, &[Clear]),

        (S::SearchCloseParen, c) if c.is_space() => (S::SearchCloseParen, &[]),
        (S::SearchCloseParen, C::CloseParen) => (S::SearchSemicolon, &[]),

        (S::SearchArrayIndex, c) if c.is_space() => (S::SearchArrayIndex, &[]),
        (S::SearchArrayIndex, C::Digit) => (S::ArrayIndex, &[Begin]),

        (S::ArrayIndex, C::Digit) => (S::ArrayIndex, &[Push]),
        (S::ArrayIndex, c) if c.is_space() => (S::SearchCloseBracket, &[EndIndex]),
        (S::ArrayIndex, C::CloseBracket) => (S::SearchArrayEqual, &[EndIndex]),

        (S::SearchCloseBracket, c) if c.is_space() => (S::SearchCloseBracket, &[]),
        (S::SearchCloseBracket, C::CloseBracket) => (S::SearchArrayEqual, &[]),

        (S::SearchArrayEqual, c) if c.is_space() => (S::SearchArrayEqual, &[]),
        (S::SearchArrayEqual, C::Equals) => (S::SearchArrayRef, &[]),

        (S::SearchArrayRef, c) if c.is_space() => (S::SearchArrayRef, &[]),
        (S::SearchArrayRef, C::Alpha) => (S::ArrayRef, &[Begin]),

        (S::ArrayRef, c) if c.is_word() => (S::ArrayRef, &[Push]),
        (S::ArrayRef, c) if c.is_space() => (S::SearchSemicolon, &[EndArrayRef]),
        (S::ArrayRef, C::Semicolon) => (S::SearchPropertyName, &[EndArrayRef, EndStatement]),

        _ => return None,
    };
    Some(step)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Ref(String),
    /// `name ("string");`
    Use(String),
    /// `name [index] = target;`
    Indexed { index: u32, target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub line: usize,
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub line: usize,
    pub type_name: String,
    pub name: String,
    pub properties: Vec<Property>,
}

/// Runs the state machine over a whole text.
pub struct Scanner {
    state: State,
    suspended: Option<State>,
    line: usize,
    column: usize,
    token: String,
    declaration: Option<Declaration>,
    property: Option<(usize, String)>,
    index: Option<u32>,
    value: Option<Value>,
    declarations: Vec<Declaration>,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            state: State::Initial,
            suspended: None,
            line: 1,
            column: 0,
            token: String::new(),
            declaration: None,
            property: None,
            index: None,
            value: None,
            declarations: Vec::new(),
        }
    }

    pub fn scan(mut self, text: &str) -> Result<Vec<Declaration>> {
        for c in text.chars() {
            self.column += 1;
            self.feed(c)?;
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
        }

        let state = match self.state {
            State::Comment => self.suspended.unwrap_or(State::Initial),
            state => state,
        };
        if state != State::Initial {
            return Err(CtlError::UnexpectedEnd { line: self.line });
        }
        Ok(self.declarations)
    }

    fn feed(&mut self, c: char) -> Result<()> {
        let class = CharClass::of(c);
        let (next, actions) = transition(self.state, class).ok_or(CtlError::MalformedGrammar {
            line: self.line,
            column: self.column,
            state: self.state.describe(),
            found: c,
        })?;

        let current = self.state;
        self.state = next;
        for action in actions {
            self.apply(*action, current, c)?;
        }
        Ok(())
    }

    fn apply(&mut self, action: Action, from: State, c: char) -> Result<()> {
        match action {
            Action::Begin => {
                self.token.clear();
                self.token.push(c);
            }
            Action::Clear => self.token.clear(),
            Action::Push => {
                let max = if from == State::QuotedString {
                    MAX_STRING_LEN
                } else {
                    MAX_IDENTIFIER_LEN
                };
                if self.token.len() >= max {
                    return Err(CtlError::TokenTooLong {
                        line: self.line,
                        max,
                    });
                }
                self.token.push(c);
            }
            Action::Suspend => self.suspended = Some(from),
            Action::Resume => self.state = self.suspended.take().unwrap_or(State::Initial),
            Action::EndType => {
                self.declaration = Some(Declaration {
                    line: self.line,
                    type_name: self.take_token(),
                    name: String::new(),
                    properties: Vec::new(),
                });
            }
            Action::EndName => {
                let name = self.take_token();
                if let Some(declaration) = self.declaration.as_mut() {
                    declaration.name = name;
                }
            }
            Action::OpenBody => {}
            Action::EndProperty => {
                let name = self.take_token();
                self.property = Some((self.line, name));
            }
            Action::EndInt => {
                let value = self.token.parse::<i64>().map_err(|_| self.malformed(from, c))?;
                self.value = Some(Value::Int(value));
            }
            Action::EndRef => self.value = Some(Value::Ref(self.take_token())),
            Action::EndString => self.value = Some(Value::Use(self.take_token())),
            Action::EndIndex => {
                let index = self.token.parse::<u32>().map_err(|_| self.malformed(from, c))?;
                self.index = Some(index);
            }
            Action::EndArrayRef => {
                let target = self.take_token();
                let index = self.index.take().unwrap_or_default();
                self.value = Some(Value::Indexed { index, target });
            }
            Action::EndStatement => {
                if let (Some((line, name)), Some(value), Some(declaration)) = (
                    self.property.take(),
                    self.value.take(),
                    self.declaration.as_mut(),
                ) {
                    declaration.properties.push(Property { line, name, value });
                }
            }
            Action::CloseBody => {
                if let Some(declaration) = self.declaration.take() {
                    self.declarations.push(declaration);
                }
            }
        }
        Ok(())
    }

    fn take_token(&mut self) -> String {
        std::mem::take(&mut self.token)
    }

    fn malformed(&self, state: State, found: char) -> CtlError {
        CtlError::MalformedGrammar {
            line: self.line,
            column: self.column,
            state: state.describe(),
            found,
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
