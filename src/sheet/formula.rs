// src/sheet/formula.rs

use thiserror::Error;

use super::address::CellId;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Ref(CellId),
    /// Intervalo já normalizado (canto superior esquerdo, canto inferior direito)
    Range(CellId, CellId),
    /// Referência bem formada mas fora da grade (ex: `AA1`, `A500`)
    InvalidRef(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sum,
    Average,
    Min,
    Max,
    Count,
    If,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "SUM" => Some(Function::Sum),
            "AVERAGE" => Some(Function::Average),
            "MIN" => Some(Function::Min),
            "MAX" => Some(Function::Max),
            "COUNT" => Some(Function::Count),
            "IF" => Some(Function::If),
            _ => None,
        }
    }

    fn accepts(&self, args: usize) -> bool {
        match self {
            Function::If => (2..=3).contains(&args),
            _ => args >= 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("caractere inesperado '{0}' na posição {1}")]
    UnexpectedChar(char, usize),
    #[error("fim inesperado da fórmula")]
    UnexpectedEnd,
    #[error("token inesperado: {0}")]
    UnexpectedToken(String),
    #[error("função desconhecida: {0}")]
    UnknownFunction(String),
    #[error("número de argumentos inválido para {0}")]
    WrongArity(String),
    #[error("texto sem aspas de fechamento")]
    UnterminatedString,
    #[error("número inválido: {0}")]
    InvalidNumber(String),
    #[error("fórmula aninhada demais (máximo {0} níveis)")]
    TooDeep(usize),
}

impl Expr {
    /// Todas as células lidas pela expressão (intervalos expandidos).
    pub fn references(&self) -> Vec<CellId> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs.sort();
        refs.dedup();
        refs
    }

    fn collect_references(&self, out: &mut Vec<CellId>) {
        match self {
            Expr::Ref(id) => out.push(*id),
            Expr::Range(start, end) => {
                for col in start.col..=end.col {
                    for row in start.row..=end.row {
                        out.push(CellId { col, row });
                    }
                }
            }
            Expr::Neg(inner) => inner.collect_references(out),
            Expr::Binary(_, left, right) => {
                left.collect_references(out);
                right.collect_references(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|arg| arg.collect_references(out)),
            Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) | Expr::InvalidRef(_) => {}
        }
    }
}

// --- Lexer ---

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Ref(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    Colon,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1 }
            '-' => { tokens.push(Token::Minus); i += 1 }
            '*' => { tokens.push(Token::Star); i += 1 }
            '/' => { tokens.push(Token::Slash); i += 1 }
            '(' => { tokens.push(Token::LParen); i += 1 }
            ')' => { tokens.push(Token::RParen); i += 1 }
            ',' => { tokens.push(Token::Comma); i += 1 }
            ':' => { tokens.push(Token::Colon); i += 1 }
            '=' => { tokens.push(Token::Eq); i += 1 }
            '<' => match chars.get(i + 1) {
                Some('=') => { tokens.push(Token::Le); i += 2 }
                Some('>') => { tokens.push(Token::Ne); i += 2 }
                _ => { tokens.push(Token::Lt); i += 1 }
            },
            '>' => match chars.get(i + 1) {
                Some('=') => { tokens.push(Token::Ge); i += 2 }
                _ => { tokens.push(Token::Gt); i += 1 }
            },
            '"' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&ch| ch == '"')
                    .ok_or(ParseError::UnterminatedString)?;
                tokens.push(Token::Str(chars[start..start + end].iter().collect()));
                i = start + end + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect::<String>().to_ascii_uppercase();
                let digits_at = word.find(|ch: char| ch.is_ascii_digit());
                match digits_at {
                    None => tokens.push(Token::Ident(word)),
                    Some(pos) if word[pos..].chars().all(|ch| ch.is_ascii_digit()) => {
                        tokens.push(Token::Ref(word))
                    }
                    Some(_) => return Err(ParseError::UnexpectedToken(word)),
                }
            }
            other => return Err(ParseError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

// --- Parser (descida recursiva) ---
//
// comparison := additive (cmp additive)?
// additive   := term (('+' | '-') term)*
// term       := unary (('*' | '/') unary)*
// unary      := ('-' | '+') unary | primary
// primary    := number | string | ref (':' ref)? | ident '(' args ')' | TRUE | FALSE | '(' comparison ')'

// Parênteses, sinais e chamadas aninhados além disso viram erro, não estouro de pilha
pub const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

/// Converte o texto de uma fórmula (sem o `=` inicial) numa expressão.
pub fn parse_formula(src: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser { tokens: tokenize(src)?, pos: 0, depth: 0 };
    let expr = parser.comparison()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ParseError::UnexpectedToken(format!("{:?}", token))),
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ParseError::UnexpectedToken(format!("{:?}", token))),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.additive()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.additive()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let right = self.term()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let right = self.unary()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
    }

    // Toda recursão passa por aqui, então é aqui que a profundidade é contada
    fn unary(&mut self) -> Result<Expr, ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        let expr = self.unary_inner();
        self.depth -= 1;
        expr
    }

    fn unary_inner(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.next().ok_or(ParseError::UnexpectedEnd)? {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::Str(text) => Ok(Expr::Text(text)),
            Token::Ref(start) => {
                if self.peek() == Some(&Token::Colon) {
                    self.pos += 1;
                    match self.next() {
                        Some(Token::Ref(end)) => Ok(range(&start, &end)),
                        Some(token) => Err(ParseError::UnexpectedToken(format!("{:?}", token))),
                        None => Err(ParseError::UnexpectedEnd),
                    }
                } else {
                    Ok(reference(&start))
                }
            }
            Token::Ident(name) if name == "TRUE" => Ok(Expr::Bool(true)),
            Token::Ident(name) if name == "FALSE" => Ok(Expr::Bool(false)),
            Token::Ident(name) => {
                let function =
                    Function::from_name(&name).ok_or_else(|| ParseError::UnknownFunction(name.clone()))?;
                self.expect(Token::LParen)?;
                let args = self.arguments()?;
                if !function.accepts(args.len()) {
                    return Err(ParseError::WrongArity(name));
                }
                Ok(Expr::Call(function, args))
            }
            Token::LParen => {
                let inner = self.comparison()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            token => Err(ParseError::UnexpectedToken(format!("{:?}", token))),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.comparison()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(token) => return Err(ParseError::UnexpectedToken(format!("{:?}", token))),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }
}

fn reference(text: &str) -> Expr {
    match CellId::parse(text) {
        Some(id) => Expr::Ref(id),
        None => Expr::InvalidRef(text.to_string()),
    }
}

fn range(start: &str, end: &str) -> Expr {
    match (CellId::parse(start), CellId::parse(end)) {
        (Some(a), Some(b)) => Expr::Range(
            CellId { col: a.col.min(b.col), row: a.row.min(b.row) },
            CellId { col: a.col.max(b.col), row: a.row.max(b.row) },
        ),
        _ => Expr::InvalidRef(format!("{}:{}", start, end)),
    }
}
