use stow::{Error, Result, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Parameter(String),
    Text(String),
    Number(String),
    Punct(char),
}

impl Token {
    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(v) if v.eq_ignore_ascii_case(keyword))
    }
}

fn tokenize(sql: &str) -> Result<Vec<Token>> {
    let mut result = Vec::new();
    let mut chars = sql.chars().peekable();
    let is_word = |c: char| c.is_alphanumeric() || matches!(c, '_' | '#' | '.' | '[' | ']');
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        text.push('\'');
                    }
                    Some('\'') => break,
                    Some(c) => text.push(c),
                    None => return Err(Error::msg("Unterminated string literal")),
                }
            }
            result.push(Token::Text(text));
        } else if c == '@' {
            chars.next();
            let mut name = String::new();
            while let Some(&c) = chars.peek().filter(|c| c.is_alphanumeric() || **c == '_') {
                name.push(c);
                chars.next();
            }
            result.push(Token::Parameter(name));
        } else if c.is_ascii_digit() || c == '-' {
            let mut number = String::from(c);
            chars.next();
            while let Some(&c) = chars.peek().filter(|c| c.is_ascii_digit() || **c == '.') {
                number.push(c);
                chars.next();
            }
            result.push(Token::Number(number));
        } else if is_word(c) {
            let mut word = String::new();
            while let Some(&c) = chars.peek().filter(|c| is_word(**c)) {
                word.push(c);
                chars.next();
            }
            result.push(Token::Word(word));
        } else if matches!(c, '(' | ')' | ',' | '=' | '*' | ';') {
            chars.next();
            result.push(Token::Punct(c));
        } else {
            return Err(Error::msg(format!("Unexpected character `{c}`")));
        }
    }
    Ok(result)
}

/// Column reference, possibly qualified: `Logs.Message`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnRef {
    pub(crate) qualifier: Option<String>,
    pub(crate) name: String,
}

impl ColumnRef {
    fn parse(word: &str) -> Self {
        let word = word.replace(['[', ']'], "");
        match word.rsplit_once('.') {
            Some((qualifier, name)) => Self {
                qualifier: Some(qualifier.into()),
                name: name.into(),
            },
            None => Self {
                qualifier: None,
                name: word,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Column(ColumnRef),
    Parameter(String),
    Literal(Value),
}

/// Conjunction of `column = operand` terms.
pub(crate) type Predicate = Vec<(ColumnRef, Operand)>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Projection {
    All,
    Items(Vec<(Operand, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Join {
    pub(crate) table: String,
    pub(crate) on: (ColumnRef, ColumnRef),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Insert {
        table: String,
        columns: Vec<String>,
        output: Option<String>,
        values: Vec<Operand>,
    },
    Update {
        table: String,
        set: Vec<(ColumnRef, Operand)>,
        join: Option<Join>,
        predicate: Predicate,
    },
    Delete {
        table: String,
        predicate: Predicate,
    },
    Select {
        projection: Projection,
        table: Option<String>,
        predicate: Predicate,
    },
    CreateTable {
        table: String,
        /// Name and `NOT NULL`.
        columns: Vec<(String, bool)>,
    },
    DropTable {
        table: String,
    },
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Result<Token> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| Error::msg("Unexpected end of statement"))?;
        self.position += 1;
        Ok(token)
    }

    fn done(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn accept_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|v| v.is_keyword(keyword)) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.accept_keyword(keyword) {
            Ok(())
        } else {
            Err(Error::msg(format!(
                "Expected `{keyword}`, found {:?}",
                self.peek()
            )))
        }
    }

    fn accept_punct(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: char) -> Result<()> {
        if self.accept_punct(punct) {
            Ok(())
        } else {
            Err(Error::msg(format!(
                "Expected `{punct}`, found {:?}",
                self.peek()
            )))
        }
    }

    fn word(&mut self) -> Result<String> {
        match self.next()? {
            Token::Word(v) => Ok(v),
            other => Err(Error::msg(format!("Expected a name, found {other:?}"))),
        }
    }

    fn table(&mut self) -> Result<String> {
        Ok(self.word()?.replace(['[', ']'], ""))
    }

    fn operand(&mut self) -> Result<Operand> {
        Ok(match self.next()? {
            Token::Word(v) if v.eq_ignore_ascii_case("NULL") => Operand::Literal(Value::Null),
            Token::Word(v) => Operand::Column(ColumnRef::parse(&v)),
            Token::Parameter(v) => Operand::Parameter(v),
            Token::Text(v) => Operand::Literal(Value::Varchar(Some(v))),
            Token::Number(v) if v.contains('.') => Operand::Literal(Value::Float64(Some(
                v.parse().map_err(|_| Error::msg(format!("Invalid number `{v}`")))?,
            ))),
            Token::Number(v) => Operand::Literal(Value::Int64(Some(
                v.parse().map_err(|_| Error::msg(format!("Invalid number `{v}`")))?,
            ))),
            Token::Punct(c) => return Err(Error::msg(format!("Unexpected `{c}`"))),
        })
    }

    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let mut result = vec![item(self)?];
        while self.accept_punct(',') {
            result.push(item(self)?);
        }
        Ok(result)
    }

    fn predicate(&mut self) -> Result<Predicate> {
        if !self.accept_keyword("WHERE") {
            return Ok(Vec::new());
        }
        let mut result = Vec::new();
        loop {
            let column = ColumnRef::parse(&self.word()?);
            self.expect_punct('=')?;
            result.push((column, self.operand()?));
            if !self.accept_keyword("AND") {
                break;
            }
        }
        Ok(result)
    }

    fn insert(&mut self) -> Result<Command> {
        self.expect_keyword("INTO")?;
        let table = self.table()?;
        let columns = if self.accept_punct('(') {
            let columns = self.list(Self::word)?;
            self.expect_punct(')')?;
            columns
        } else {
            Vec::new()
        };
        let output = if self.accept_keyword("OUTPUT") {
            Some(ColumnRef::parse(&self.word()?).name)
        } else {
            None
        };
        let values = if self.accept_keyword("DEFAULT") {
            self.expect_keyword("VALUES")?;
            Vec::new()
        } else {
            self.expect_keyword("VALUES")?;
            self.expect_punct('(')?;
            let values = self.list(Self::operand)?;
            self.expect_punct(')')?;
            values
        };
        if columns.len() != values.len() {
            return Err(Error::msg(
                "There are fewer columns in the INSERT statement than values specified in the VALUES clause",
            ));
        }
        Ok(Command::Insert {
            table,
            columns,
            output,
            values,
        })
    }

    fn update(&mut self) -> Result<Command> {
        let table = self.table()?;
        self.expect_keyword("SET")?;
        let set = self.list(|p| {
            let column = ColumnRef::parse(&p.word()?);
            p.expect_punct('=')?;
            Ok((column, p.operand()?))
        })?;
        let join = if self.accept_keyword("FROM") {
            let from = self.table()?;
            if !from.eq_ignore_ascii_case(&table) {
                return Err(Error::msg(format!(
                    "Update source `{from}` must be the target `{table}`"
                )));
            }
            self.expect_keyword("INNER")?;
            self.expect_keyword("JOIN")?;
            let joined = self.table()?;
            self.expect_keyword("ON")?;
            let left = ColumnRef::parse(&self.word()?);
            self.expect_punct('=')?;
            let right = ColumnRef::parse(&self.word()?);
            Some(Join {
                table: joined,
                on: (left, right),
            })
        } else {
            None
        };
        Ok(Command::Update {
            table,
            set,
            join,
            predicate: self.predicate()?,
        })
    }

    fn select(&mut self) -> Result<Command> {
        let projection = if self.accept_punct('*') {
            Projection::All
        } else {
            Projection::Items(self.list(|p| {
                let operand = p.operand()?;
                let label = if p.accept_keyword("AS") {
                    p.word()?
                } else {
                    match &operand {
                        Operand::Column(c) => c.name.clone(),
                        Operand::Parameter(v) => v.clone(),
                        Operand::Literal(..) => String::new(),
                    }
                };
                Ok((operand, label))
            })?)
        };
        let table = if self.accept_keyword("FROM") {
            Some(self.table()?)
        } else {
            None
        };
        Ok(Command::Select {
            projection,
            table,
            predicate: self.predicate()?,
        })
    }

    fn create_table(&mut self) -> Result<Command> {
        self.expect_keyword("TABLE")?;
        let table = self.table()?;
        self.expect_punct('(')?;
        let columns = self.list(|p| {
            let name = p.word()?;
            let mut not_null = false;
            while !matches!(p.peek(), Some(Token::Punct(',' | ')')) | None) {
                match p.next()? {
                    Token::Word(v) if v.eq_ignore_ascii_case("NOT") => {
                        p.expect_keyword("NULL")?;
                        not_null = true;
                    }
                    Token::Punct('(') => {
                        while !p.accept_punct(')') {
                            p.next()?;
                        }
                    }
                    _ => {}
                }
            }
            Ok((name, not_null))
        })?;
        self.expect_punct(')')?;
        Ok(Command::CreateTable { table, columns })
    }

    fn command(&mut self) -> Result<Command> {
        let command = match self.word()? {
            v if v.eq_ignore_ascii_case("INSERT") => self.insert()?,
            v if v.eq_ignore_ascii_case("UPDATE") => self.update()?,
            v if v.eq_ignore_ascii_case("SELECT") => self.select()?,
            v if v.eq_ignore_ascii_case("DELETE") => {
                self.expect_keyword("FROM")?;
                Command::Delete {
                    table: self.table()?,
                    predicate: self.predicate()?,
                }
            }
            v if v.eq_ignore_ascii_case("CREATE") => self.create_table()?,
            v if v.eq_ignore_ascii_case("DROP") => {
                self.expect_keyword("TABLE")?;
                Command::DropTable {
                    table: self.table()?,
                }
            }
            v => return Err(Error::msg(format!("Unsupported statement `{v}`"))),
        };
        if !self.done() {
            return Err(Error::msg(format!(
                "Unexpected {:?} after the statement",
                self.peek()
            )));
        }
        Ok(command)
    }
}

/// Parse a batch of `;` separated commands.
pub(crate) fn parse(sql: &str) -> Result<Vec<Command>> {
    let tokens = tokenize(sql)?;
    tokens
        .split(|v| *v == Token::Punct(';'))
        .filter(|v| !v.is_empty())
        .map(|tokens| {
            Parser {
                tokens: tokens.to_vec(),
                position: 0,
            }
            .command()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ColumnRef, Command, Operand, Projection, parse};
    use stow::Value;

    #[test]
    fn parse_insert_with_output() {
        let commands = parse("INSERT INTO Logs (A,B) OUTPUT INSERTED.LogId VALUES (@A,@B)").unwrap();
        assert_eq!(
            commands,
            [Command::Insert {
                table: "Logs".into(),
                columns: vec!["A".into(), "B".into()],
                output: Some("LogId".into()),
                values: vec![Operand::Parameter("A".into()), Operand::Parameter("B".into())],
            }]
        );
    }

    #[test]
    fn parse_merge_batch() {
        let commands = parse(
            "UPDATE Logs SET Logs.A = #StowLogs.A FROM Logs INNER JOIN #StowLogs ON Logs.Id = #StowLogs.Id; DROP TABLE #StowLogs;",
        )
        .unwrap();
        assert_eq!(commands.len(), 2);
        let Command::Update { join: Some(join), set, .. } = &commands[0] else {
            panic!("Expected an update with a join, found {:?}", commands[0]);
        };
        assert_eq!(join.table, "#StowLogs");
        assert_eq!(
            set[0].1,
            Operand::Column(ColumnRef {
                qualifier: Some("#StowLogs".into()),
                name: "A".into()
            })
        );
        assert_eq!(
            commands[1],
            Command::DropTable {
                table: "#StowLogs".into()
            }
        );
    }

    #[test]
    fn parse_select_literals() {
        let commands = parse("SELECT 'it''s' AS Text, NULL AS Nothing, 4 AS Four").unwrap();
        let Command::Select {
            projection: Projection::Items(items),
            table: None,
            ..
        } = &commands[0]
        else {
            panic!("Unexpected {:?}", commands[0]);
        };
        assert_eq!(items[0].0, Operand::Literal(Value::Varchar(Some("it's".into()))));
        assert_eq!(items[1].0, Operand::Literal(Value::Null));
        assert_eq!(items[2], (Operand::Literal(Value::Int64(Some(4))), "Four".into()));
    }

    #[test]
    fn reject_unknown_statement() {
        assert!(parse("MERGE INTO Logs").is_err());
        assert!(parse("INSERT INTO Logs (A) VALUES (@A, @B)").is_err());
    }
}
