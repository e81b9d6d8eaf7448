use super::{
    CreateIndexData, CreateTableData, CreateViewData, DeleteData, ExecData, InsertData, Lexer,
    ModifyData, QueryData, Statement, Token,
};
use crate::common::{DbError, Result};
use crate::query::{Constant, Expression, Predicate, Term};
use crate::record::Schema;

/// Recursive-descent parser for the SQL subset:
///
/// ```text
/// <query>     := SELECT <select_list> FROM <id> {, <id>} [WHERE <pred>]
/// <pred>      := <term> {AND <term>}
/// <term>      := <expr> = <expr>
/// <expr>      := <id> | <int> | <string>
/// <insert>    := INSERT INTO <id> ( <id> {, <id>} ) VALUES ( <const> {, <const>} )
/// <delete>    := DELETE FROM <id> [WHERE <pred>]
/// <modify>    := UPDATE <id> SET <id> = <expr> [WHERE <pred>]
/// <create>    := CREATE TABLE <id> ( <id> <type> {, <id> <type>} )
///              | CREATE VIEW <id> AS <query>
///              | CREATE INDEX <id> ON <id> ( <id> )
/// <type>      := INT | VARCHAR ( <int> )
/// ```
///
/// A single trailing `;` is accepted.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(sql: &str) -> Result<Self> {
        Ok(Self {
            tokens: Lexer::new(sql).tokenize()?,
            pos: 0,
        })
    }

    /// Parses one statement of either kind.
    pub fn statement(&mut self) -> Result<Statement> {
        let statement = if self.current() == &Token::Keyword("select") {
            Statement::Query(self.query_inner()?)
        } else {
            Statement::Exec(self.update_inner()?)
        };
        self.finish()?;
        Ok(statement)
    }

    /// Parses a whole input that must be a `SELECT`.
    pub fn query(&mut self) -> Result<QueryData> {
        let data = self.query_inner()?;
        self.finish()?;
        Ok(data)
    }

    /// Parses a whole input that must be a modifying statement.
    pub fn update_cmd(&mut self) -> Result<ExecData> {
        let data = self.update_inner()?;
        self.finish()?;
        Ok(data)
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn unexpected(&self, expected: &str) -> DbError {
        DbError::Parse(format!("expected {expected}, found {:?}", self.current()))
    }

    fn finish(&mut self) -> Result<()> {
        self.eat_delim(';');
        match self.current() {
            Token::Eof => Ok(()),
            _ => Err(self.unexpected("end of statement")),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.current() {
            Token::Keyword(k) if *k == keyword => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("keyword {keyword}")))
        }
    }

    fn eat_delim(&mut self, delim: char) -> bool {
        match self.current() {
            Token::Delim(d) if *d == delim => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn expect_delim(&mut self, delim: char) -> Result<()> {
        if self.eat_delim(delim) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{delim}'")))
        }
    }

    fn id(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Id(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn int_constant(&mut self) -> Result<i32> {
        match self.current() {
            Token::IntConst(v) => {
                let v = *v;
                self.advance();
                Ok(v)
            }
            _ => Err(self.unexpected("integer")),
        }
    }

    fn constant(&mut self) -> Result<Constant> {
        match self.current().clone() {
            Token::IntConst(v) => {
                self.advance();
                Ok(Constant::Int(v))
            }
            Token::StrConst(s) => {
                self.advance();
                Ok(Constant::Str(s))
            }
            _ => Err(self.unexpected("constant")),
        }
    }

    fn expression(&mut self) -> Result<Expression> {
        match self.current() {
            Token::Id(_) => Ok(Expression::Field(self.id()?)),
            _ => Ok(Expression::Const(self.constant()?)),
        }
    }

    fn term(&mut self) -> Result<Term> {
        let lhs = self.expression()?;
        self.expect_delim('=')?;
        let rhs = self.expression()?;
        Ok(Term::new(lhs, rhs))
    }

    fn predicate(&mut self) -> Result<Predicate> {
        let mut pred = Predicate::from_term(self.term()?);
        while self.eat_keyword("and") {
            pred.conjoin_with(Predicate::from_term(self.term()?));
        }
        Ok(pred)
    }

    fn optional_where(&mut self) -> Result<Predicate> {
        if self.eat_keyword("where") {
            self.predicate()
        } else {
            Ok(Predicate::new())
        }
    }

    fn id_list(&mut self) -> Result<Vec<String>> {
        let mut ids = vec![self.id()?];
        while self.eat_delim(',') {
            ids.push(self.id()?);
        }
        Ok(ids)
    }

    fn query_inner(&mut self) -> Result<QueryData> {
        self.expect_keyword("select")?;
        let fields = if self.eat_delim('*') {
            vec!["*".to_string()]
        } else {
            self.id_list()?
        };
        self.expect_keyword("from")?;
        let tables = self.id_list()?;
        let pred = self.optional_where()?;
        Ok(QueryData {
            fields,
            tables,
            pred,
        })
    }

    fn update_inner(&mut self) -> Result<ExecData> {
        match self.current() {
            Token::Keyword("insert") => self.insert(),
            Token::Keyword("delete") => self.delete(),
            Token::Keyword("update") => self.modify(),
            Token::Keyword("create") => self.create(),
            _ => Err(self.unexpected("INSERT, DELETE, UPDATE or CREATE")),
        }
    }

    fn insert(&mut self) -> Result<ExecData> {
        self.expect_keyword("insert")?;
        self.expect_keyword("into")?;
        let table = self.id()?;
        self.expect_delim('(')?;
        let fields = self.id_list()?;
        self.expect_delim(')')?;
        self.expect_keyword("values")?;
        self.expect_delim('(')?;
        let mut values = vec![self.constant()?];
        while self.eat_delim(',') {
            values.push(self.constant()?);
        }
        self.expect_delim(')')?;
        Ok(ExecData::Insert(InsertData {
            table,
            fields,
            values,
        }))
    }

    fn delete(&mut self) -> Result<ExecData> {
        self.expect_keyword("delete")?;
        self.expect_keyword("from")?;
        let table = self.id()?;
        let pred = self.optional_where()?;
        Ok(ExecData::Delete(DeleteData { table, pred }))
    }

    fn modify(&mut self) -> Result<ExecData> {
        self.expect_keyword("update")?;
        let table = self.id()?;
        self.expect_keyword("set")?;
        let field = self.id()?;
        self.expect_delim('=')?;
        let new_value = self.expression()?;
        let pred = self.optional_where()?;
        Ok(ExecData::Modify(ModifyData {
            table,
            field,
            new_value,
            pred,
        }))
    }

    fn create(&mut self) -> Result<ExecData> {
        self.expect_keyword("create")?;
        if self.eat_keyword("table") {
            self.create_table()
        } else if self.eat_keyword("view") {
            let view = self.id()?;
            self.expect_keyword("as")?;
            let query = self.query_inner()?;
            Ok(ExecData::CreateView(CreateViewData { view, query }))
        } else if self.eat_keyword("index") {
            let index = self.id()?;
            self.expect_keyword("on")?;
            let table = self.id()?;
            self.expect_delim('(')?;
            let field = self.id()?;
            self.expect_delim(')')?;
            Ok(ExecData::CreateIndex(CreateIndexData {
                index,
                table,
                field,
            }))
        } else {
            Err(self.unexpected("TABLE, VIEW or INDEX"))
        }
    }

    fn create_table(&mut self) -> Result<ExecData> {
        let table = self.id()?;
        self.expect_delim('(')?;
        let mut schema = Schema::new();
        loop {
            let field = self.id()?;
            if self.eat_keyword("int") {
                schema.add_int_field(field);
            } else if self.eat_keyword("varchar") {
                self.expect_delim('(')?;
                let length = self.int_constant()?;
                if length <= 0 {
                    return Err(DbError::Parse(format!(
                        "varchar length of {field} must be positive"
                    )));
                }
                self.expect_delim(')')?;
                schema.add_string_field(field, length as usize);
            } else {
                return Err(self.unexpected("INT or VARCHAR"));
            }
            if !self.eat_delim(',') {
                break;
            }
        }
        self.expect_delim(')')?;
        Ok(ExecData::CreateTable(CreateTableData { table, schema }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Expression {
        Expression::Field(name.into())
    }

    #[test]
    fn test_query() {
        let data = Parser::new("SELECT B, a FROM T1, t2 WHERE A = 10 AND b = C")
            .unwrap()
            .query()
            .unwrap();
        assert_eq!(data.fields, vec!["b", "a"]);
        assert_eq!(data.tables, vec!["t1", "t2"]);
        assert_eq!(data.pred.terms().len(), 2);
        assert_eq!(data.pred.equates_with_constant("a"), Some(&Constant::Int(10)));
        assert_eq!(data.to_string(), "select b, a from t1, t2 where a = 10 and b = c");
    }

    #[test]
    fn test_star_and_round_trip() {
        let sql = "select * from t where name = 'O''Brien'";
        let data = Parser::new(sql).unwrap().query().unwrap();
        assert_eq!(data.fields, vec!["*"]);
        assert_eq!(data.to_string(), sql);
        let again = Parser::new(&data.to_string()).unwrap().query().unwrap();
        assert_eq!(again, data);
    }

    #[test]
    fn test_insert() {
        let stmt = Parser::new("insert into t1(a, b) values (-3, 'x');")
            .unwrap()
            .update_cmd()
            .unwrap();
        assert_eq!(
            stmt,
            ExecData::Insert(InsertData {
                table: "t1".into(),
                fields: vec!["a".into(), "b".into()],
                values: vec![Constant::Int(-3), Constant::from("x")],
            })
        );
    }

    #[test]
    fn test_modify_and_delete() {
        let stmt = Parser::new("update t1 set a = b where a = 1000")
            .unwrap()
            .update_cmd()
            .unwrap();
        let ExecData::Modify(data) = stmt else {
            panic!("expected modify");
        };
        assert_eq!(data.field, "a");
        assert_eq!(data.new_value, field("b"));
        assert_eq!(data.pred.terms().len(), 1);

        let stmt = Parser::new("delete from t1").unwrap().update_cmd().unwrap();
        assert_eq!(
            stmt,
            ExecData::Delete(DeleteData {
                table: "t1".into(),
                pred: Predicate::new(),
            })
        );
    }

    #[test]
    fn test_create() {
        let stmt = Parser::new("create table t1 (a int, b varchar(9))")
            .unwrap()
            .update_cmd()
            .unwrap();
        let ExecData::CreateTable(data) = stmt else {
            panic!("expected create table");
        };
        assert_eq!(data.schema.fields(), &["a".to_string(), "b".to_string()]);
        assert_eq!(data.schema.length("b"), Some(9));

        let stmt = Parser::new("create view v as select a from t1 where a = 1")
            .unwrap()
            .update_cmd()
            .unwrap();
        let ExecData::CreateView(data) = stmt else {
            panic!("expected create view");
        };
        assert_eq!(data.view_def(), "select a from t1 where a = 1");

        let stmt = Parser::new("create index idx on t1 (b)")
            .unwrap()
            .statement()
            .unwrap();
        assert_eq!(
            stmt,
            Statement::Exec(ExecData::CreateIndex(CreateIndexData {
                index: "idx".into(),
                table: "t1".into(),
                field: "b".into(),
            }))
        );
    }

    #[test]
    fn test_syntax_errors() {
        let bad = [
            "select from t",
            "select a from",
            "select a from t where a",
            "select a from t extra",
            "insert into t (a) values ()",
            "create table t (a float)",
            "create table t (a varchar(0))",
            "drop table t",
        ];
        for sql in bad {
            let result = Parser::new(sql).and_then(|mut p| p.statement());
            assert!(
                matches!(result, Err(DbError::Parse(_))),
                "{sql} should not parse"
            );
        }
        assert!(Parser::new("insert into t (a) values (1)").unwrap().query().is_err());
    }
}
