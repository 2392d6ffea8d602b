use crate::error::ParseError;
use crate::expr::*;
use crate::literal::Literal;
use crate::stmt::*;
use crate::token::{Token, Type};

type ParseResult<T> = Result<T, ParseError>;

const MAX_ARGS: usize = 255;

/// Returns whether the next token is any of the given types, consuming it
/// if so.
macro_rules! match_token {
    ( $self:ident, $( $type:expr ),+ ) => {
        {
            if $( $self.check($type) ) ||* {
                $self.advance();
                true
            } else {
                false
            }
        }
    }
}

/// Recursive-descent parser over the grammar in precedence order, low to
/// high: assignment, or, and, equality, comparison, term, factor, unary,
/// call, primary.
///
/// - program     -> declaration* EOF ;
/// - declaration -> classDecl | funDecl | varDecl | statement ;
/// - classDecl   -> "class" IDENTIFIER ( "<" IDENTIFIER )? "{" function* "}" ;
/// - funDecl     -> "fun" function ;
/// - varDecl     -> "var" IDENTIFIER ( "=" expression )? ";" ;
/// - function    -> IDENTIFIER "(" parameters? ")" block ;
/// - parameters  -> IDENTIFIER ( "," IDENTIFIER )* ;
/// - statement   -> exprStmt | forStmt | ifStmt | printStmt | returnStmt | whileStmt | block ;
/// - exprStmt    -> expression ";" ;
/// - forStmt     -> "for" "(" ( varDecl | exprStmt | ";" ) expression? ";" expression? ")" statement ;
/// - ifStmt      -> "if" "(" expression ")" statement ( "else" statement )? ;
/// - printStmt   -> "print" expression ";" ;
/// - returnStmt  -> "return" expression? ";" ;
/// - whileStmt   -> "while" "(" expression ")" statement ;
/// - block       -> "{" declaration* "}" ;
/// - expression  -> assignment ;
/// - assignment  -> ( call "." )? IDENTIFIER "=" assignment | logic_or ;
/// - logic_or    -> logic_and ( "or" logic_and )* ;
/// - logic_and   -> equality ( "and" equality )* ;
/// - equality    -> comparison ( ( "!=" | "==" ) comparison )* ;
/// - comparison  -> term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
/// - term        -> factor ( ( "+" | "-" ) factor )* ;
/// - factor      -> unary ( ( "*" | "/" ) unary )* ;
/// - unary       -> ( "!" | "-" ) unary | call ;
/// - arguments   -> expression ( "," expression )* ;
/// - call        -> primary ( "(" arguments? ")" | "." IDENTIFIER )* ;
/// - primary     -> NUMBER | STRING | "false" | "true" | "nil" | "this" | "(" expression ")" | IDENTIFIER | "super" "." IDENTIFIER | lambda ;
/// - lambda      -> "fun" "(" parameters? ")" block ;
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: u64,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0, next_id: 0, errors: Vec::new() }
    }

    /// Parses the whole token stream into a program, collecting every parse
    /// error encountered (recovering at statement boundaries between them)
    /// rather than aborting on the first.
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<ParseError>) {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        (statements, self.errors)
    }

    fn node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().r#type == Type::EOF
    }

    fn check(&self, r#type: Type) -> bool {
        !self.is_at_end() && self.peek().r#type == r#type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn consume(&mut self, r#type: Type, message: &str) -> ParseResult<Token> {
        if self.check(r#type) {
            return Ok(self.advance().clone());
        }

        Err(ParseError { token: self.peek().clone(), message: message.to_string() })
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let statement = if match_token!(self, Type::Class) {
            self.class_declaration()
        } else if match_token!(self, Type::Fun) {
            self.function("function").map(Stmt::Fun)
        } else if match_token!(self, Type::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match statement {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expect class name")?;

        let superclass = if match_token!(self, Type::Less) {
            self.consume(Type::Identifier, "Expect superclass name")?;
            Some(Expr::Variable(VariableData { id: self.node_id(), name: self.previous().clone() }))
        } else {
            None
        };

        self.consume(Type::LeftBrace, "Expect '{' before class body")?;

        let mut methods = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(Type::RightBrace, "Expect '}' after class body")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expect variable name")?;

        let initializer = if match_token!(self, Type::Equal) { Some(self.expression()?) } else { None };

        self.consume(Type::Semicolon, "Expect ';' after variable declaration")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after condition")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While(WhileData { condition, body }))
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if match_token!(self, Type::For) {
            return self.for_statement();
        }
        if match_token!(self, Type::If) {
            return self.if_statement();
        }
        if match_token!(self, Type::Print) {
            return self.print_statement();
        }
        if match_token!(self, Type::Return) {
            return self.return_statement();
        }
        if match_token!(self, Type::While) {
            return self.while_statement();
        }
        if match_token!(self, Type::LeftBrace) {
            return Ok(Stmt::Block(BlockData { statements: self.block()? }));
        }

        self.expression_statement()
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `{ init; while (cond) { body; incr; } }`. No `For` statement variant
    /// exists past this point.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'for'")?;

        let initializer = if match_token!(self, Type::Semicolon) {
            None
        } else if match_token!(self, Type::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(Type::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(Type::Semicolon, "Expect ';' after loop condition")?;

        let increment = if !self.check(Type::RightParen) { Some(self.expression()?) } else { None };
        self.consume(Type::RightParen, "Expect ')' after loop clauses")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(BlockData {
                statements: vec![body, Stmt::Expression(ExpressionData { expr: increment })],
            });
        }

        body = Stmt::While(WhileData {
            condition: condition.unwrap_or(Expr::Literal(Literal::Bool(true))),
            body: Box::new(body),
        });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if match_token!(self, Type::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after value")?;
        Ok(Stmt::Print(PrintData { expr }))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = if self.check(Type::Semicolon) { None } else { Some(self.expression()?) };

        self.consume(Type::Semicolon, "Expect ';' after return value")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after expression")?;
        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    fn function(&mut self, kind: &str) -> ParseResult<FunData> {
        let name = self.consume(Type::Identifier, &format!("Expect {kind} name"))?;

        self.consume(Type::LeftParen, &format!("Expect '(' after {kind} name"))?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(ParseError {
                        token: self.peek().clone(),
                        message: format!("Cannot have more than {MAX_ARGS} parameters"),
                    });
                }

                params.push(self.consume(Type::Identifier, "Expect parameter name")?);

                if !match_token!(self, Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen, "Expect ')' after parameters")?;
        self.consume(Type::LeftBrace, &format!("Expect '{{' before {kind} body"))?;

        let body = self.block()?;

        Ok(FunData { name, params, body })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(Type::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(Type::RightBrace, "Expect '}' after block")?;
        Ok(statements)
    }

    /// Parses an `or` expression first; on a trailing `=`, re-parses the
    /// right side as another assignment and converts the left side in
    /// place: `Variable` becomes `Assign`, `Get` becomes `Set`. Anything
    /// else is an "invalid assignment target" error that does not abort
    /// the parse — the already-parsed left expression is still returned.
    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if match_token!(self, Type::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(data) => Ok(Expr::Assign(AssignData {
                    id: self.node_id(),
                    name: data.name,
                    value: Box::new(value),
                })),
                Expr::Get(data) => Ok(Expr::Set(SetData {
                    object: data.object,
                    name: data.name,
                    value: Box::new(value),
                })),
                other => {
                    self.errors.push(ParseError {
                        token: equals,
                        message: "Invalid assignment target".to_string(),
                    });
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while match_token!(self, Type::Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while match_token!(self, Type::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while match_token!(self, Type::BangEqual, Type::EqualEqual) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while match_token!(self, Type::Greater, Type::GreaterEqual, Type::Less, Type::LessEqual) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while match_token!(self, Type::Minus, Type::Plus) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while match_token!(self, Type::Slash, Type::Star) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if match_token!(self, Type::Bang, Type::Minus) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(UnaryData { operator, expr: Box::new(right) }));
        }

        self.call()
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(Type::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    self.errors.push(ParseError {
                        token: self.peek().clone(),
                        message: format!("Cannot have more than {MAX_ARGS} arguments"),
                    });
                }

                arguments.push(self.expression()?);

                if !match_token!(self, Type::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(Type::RightParen, "Expect ')' after arguments")?;

        Ok(Expr::Call(CallData { callee: Box::new(callee), paren, arguments }))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if match_token!(self, Type::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if match_token!(self, Type::Dot) {
                let name = self.consume(Type::Identifier, "Expected property name after '.'")?;
                expr = Expr::Get(GetData { object: Box::new(expr), name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if match_token!(self, Type::False) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        }
        if match_token!(self, Type::True) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        }
        if match_token!(self, Type::Nil) {
            return Ok(Expr::Literal(Literal::Nil));
        }
        if match_token!(self, Type::Number, Type::String) {
            return Ok(Expr::Literal(
                self.previous().literal.clone().expect("number or string token to carry a literal"),
            ));
        }
        if match_token!(self, Type::Super) {
            let keyword = self.previous().clone();
            self.consume(Type::Dot, "Expect '.' after 'super'")?;
            let method = self.consume(Type::Identifier, "Expect superclass method name")?;
            return Ok(Expr::Super(SuperData { id: self.node_id(), keyword, method }));
        }
        if match_token!(self, Type::This) {
            return Ok(Expr::This(ThisData { id: self.node_id(), keyword: self.previous().clone() }));
        }
        if match_token!(self, Type::Identifier) {
            return Ok(Expr::Variable(VariableData { id: self.node_id(), name: self.previous().clone() }));
        }
        if match_token!(self, Type::LeftParen) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "Expect ')' after expression")?;
            return Ok(Expr::Grouping(GroupingData { expr: Box::new(expr) }));
        }
        if match_token!(self, Type::Fun) {
            return self.function_expression();
        }

        Err(ParseError { token: self.peek().clone(), message: "Expect expression".to_string() })
    }

    /// Parses an anonymous function starting after the `fun` keyword has
    /// already been consumed: same parameter list and body as a named
    /// `function`, just with no name to declare.
    fn function_expression(&mut self) -> ParseResult<Expr> {
        self.consume(Type::LeftParen, "Expect '(' after 'fun'")?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(ParseError {
                        token: self.peek().clone(),
                        message: format!("Cannot have more than {MAX_ARGS} parameters"),
                    });
                }

                params.push(self.consume(Type::Identifier, "Expect parameter name")?);

                if !match_token!(self, Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen, "Expect ')' after parameters")?;
        self.consume(Type::LeftBrace, "Expect '{' before function body")?;

        let body = self.block()?;

        Ok(Expr::Function(FunctionData { params, body }))
    }

    /// Advances to the next plausible statement boundary after a parse
    /// error: one token, then until the previous token was `;` or the next
    /// token starts a new declaration/statement.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().r#type == Type::Semicolon {
                return;
            }

            match self.peek().r#type {
                Type::Class | Type::Fun | Type::Var | Type::For | Type::If | Type::While
                | Type::Print | Type::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<ParseError>) {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        assert!(scan_errors.is_empty());
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let (stmts, errors) = parse("1 + 2 * 3;");
        assert!(errors.is_empty());
        assert!(matches!(stmts[0], Stmt::Expression(_)));
    }

    #[test]
    fn for_loop_desugars_to_block_and_while() {
        let (stmts, errors) = parse("for (var i = 0; i < 1; i = i + 1) print i;");
        assert!(errors.is_empty());
        match &stmts[0] {
            Stmt::Block(BlockData { statements }) => {
                assert_eq!(statements.len(), 2);
                assert!(matches!(statements[0], Stmt::Var(_)));
                assert!(matches!(statements[1], Stmt::While(_)));
            }
            other => panic!("expected desugared block, got {other:?}"),
        }
    }

    #[test]
    fn invalid_assignment_target_reports_error_without_aborting() {
        let (stmts, errors) = parse("1 = 2;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid assignment target");
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn synchronize_recovers_at_next_statement() {
        let (stmts, errors) = parse("var ; print 1;");
        assert_eq!(errors.len(), 1);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn excess_parameters_is_a_parse_error() {
        let params = (0..256).map(|i| format!("a{i}")).collect::<Vec<_>>().join(", ");
        let source = format!("fun f({params}) {{}}");
        let (_, errors) = parse(&source);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("255 parameters"));
    }
}
