//! A minimal reference [`ScriptParser`] covering the call/block/expression
//! grammar (module/function definitions, `if` as a plain module call, the
//! three tag characters plus `*` disabling, vectors and ranges). Real
//! deployments are expected to bring their own parser; this one exists so
//! the CLI has something to run end to end.

use std::rc::Rc;

use solidscript::{AbstractFunction, AbstractModule, Arg, Expression, FunctionTable, Module, ModuleInstanciation, ModuleTable, Param, ScriptParser, Value};

use crate::lexer::{lex, Token};

pub struct DemoParser;

impl ScriptParser for DemoParser {
    fn parse(&self, text: &str) -> Option<Module> {
        let tokens = lex(text).ok()?;
        let mut p = Parser { tokens, pos: 0 };

        let mut functions = FunctionTable::new();
        let mut modules = ModuleTable::new();
        solidscript::builtins::register_all(&mut functions, &mut modules);

        let mut assignments = Vec::new();
        let mut children = Vec::new();
        p.parse_stmts(&mut assignments, &mut children, &mut functions, &mut modules).ok()?;

        let functions = Rc::new(functions);
        let modules = Rc::new(modules);
        let mut module = Module::new(functions, modules);
        module.assignments = assignments;
        module.children = children;
        Some(module)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, String>;

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, tok: &Token) -> PResult<()> {
        if self.peek() == tok {
            self.advance();
            Ok(())
        } else {
            Err(format!("expected {tok:?}, found {:?}", self.peek()))
        }
    }

    fn ident(&mut self) -> PResult<String> {
        match self.advance() {
            Token::Ident(s) => Ok(s),
            other => Err(format!("expected identifier, found {other:?}")),
        }
    }

    /// Parses a sequence of statements into `assignments`/`children`,
    /// folding any `module`/`function` definitions directly into
    /// `functions`/`modules` as they're encountered — this is what lets a
    /// module refer to itself or to a sibling defined later in the same
    /// block, since lookups only happen lazily at evaluation time.
    fn parse_stmts(
        &mut self,
        assignments: &mut Vec<(String, Expression)>,
        children: &mut Vec<ModuleInstanciation>,
        functions: &mut FunctionTable,
        modules: &mut ModuleTable,
    ) -> PResult<()> {
        loop {
            match self.peek().clone() {
                Token::Eof | Token::RBrace => return Ok(()),
                Token::Ident(kw) if kw == "module" => {
                    self.parse_module_def(functions, modules)?;
                }
                Token::Ident(kw) if kw == "function" => {
                    self.parse_function_def(functions)?;
                }
                _ => {
                    if let Some((name, expr)) = self.try_parse_assignment()? {
                        assignments.push((name, expr));
                    } else if let Some(inst) = self.parse_call_statement()? {
                        children.push(inst);
                    }
                }
            }
        }
    }

    /// `IDENT = expr ;`, disambiguated from a module call by one token of
    /// lookahead past the identifier.
    fn try_parse_assignment(&mut self) -> PResult<Option<(String, Expression)>> {
        if let Token::Ident(name) = self.peek().clone() {
            if self.tokens.get(self.pos + 1) == Some(&Token::Assign) {
                self.advance();
                self.advance();
                let expr = self.parse_expr()?;
                self.eat(&Token::Semi)?;
                return Ok(Some((name, expr)));
            }
        }
        Ok(None)
    }

    /// Nested `module`/`function` definitions fold into the *same*
    /// `functions`/`modules` tables as the rest of the script (a flat
    /// namespace, not real block scoping) so that a module can call itself
    /// or a sibling defined anywhere in the script. Accordingly the
    /// `UserModule` this produces leaves its own `functions`/`modules`
    /// fields `None`: its body just inherits whatever table is active at
    /// the call site, which by evaluation time is the fully-populated root
    /// table — the only way a module's body can see its own name.
    fn parse_module_def(&mut self, functions: &mut FunctionTable, modules: &mut ModuleTable) -> PResult<()> {
        self.advance(); // 'module'
        let name = self.ident()?;
        let params = self.parse_param_list()?;

        let mut assignments = Vec::new();
        let mut children = Vec::new();
        self.eat(&Token::LBrace)?;
        self.parse_stmts(&mut assignments, &mut children, functions, modules)?;
        self.eat(&Token::RBrace)?;

        modules.insert(
            name,
            AbstractModule::UserModule {
                params,
                assignments,
                functions: None,
                modules: None,
                children,
            },
        );
        Ok(())
    }

    fn parse_function_def(&mut self, functions: &mut FunctionTable) -> PResult<()> {
        self.advance(); // 'function'
        let name = self.ident()?;
        let params = self.parse_param_list()?;
        self.eat(&Token::Assign)?;
        let body = self.parse_expr()?;
        self.eat(&Token::Semi)?;
        functions.insert(name, AbstractFunction::UserFunction { params, body });
        Ok(())
    }

    fn parse_param_list(&mut self) -> PResult<Vec<Param>> {
        self.eat(&Token::LParen)?;
        let mut params = Vec::new();
        while self.peek() != &Token::RParen {
            let name = self.ident()?;
            if self.peek() == &Token::Assign {
                self.advance();
                let default = self.parse_expr()?;
                params.push(Param::with_default(name, default));
            } else {
                params.push(Param::required(name));
            }
            if self.peek() == &Token::Comma {
                self.advance();
            }
        }
        self.eat(&Token::RParen)?;
        Ok(params)
    }

    fn parse_arg_list(&mut self) -> PResult<Vec<Arg>> {
        self.eat(&Token::LParen)?;
        let mut args = Vec::new();
        while self.peek() != &Token::RParen {
            if let Token::Ident(name) = self.peek().clone() {
                if self.tokens.get(self.pos + 1) == Some(&Token::Assign) {
                    self.advance();
                    self.advance();
                    let expr = self.parse_expr()?;
                    args.push(Arg::named(name, expr));
                    if self.peek() == &Token::Comma {
                        self.advance();
                    }
                    continue;
                }
            }
            let expr = self.parse_expr()?;
            args.push(Arg::positional(expr));
            if self.peek() == &Token::Comma {
                self.advance();
            }
        }
        self.eat(&Token::RParen)?;
        Ok(args)
    }

    /// One tagged statement: `(% | # | ! | *)? call_statement`. Returns
    /// `None` for a `*`-disabled statement — the core never sees those at
    /// all, rather than being handed a no-op instantiation that would just
    /// warn about an unknown module name.
    fn parse_call_statement(&mut self) -> PResult<Option<ModuleInstanciation>> {
        let mut tag_background = false;
        let mut tag_highlight = false;
        let mut tag_root = false;
        let mut disabled = false;
        loop {
            match self.peek() {
                Token::Percent => {
                    tag_background = true;
                    self.advance();
                }
                Token::Hash => {
                    tag_highlight = true;
                    self.advance();
                }
                Token::Bang => {
                    tag_root = true;
                    self.advance();
                }
                Token::Star => {
                    disabled = true;
                    self.advance();
                }
                _ => break,
            }
        }

        let name = self.ident()?;
        if name == "if" {
            let inst = self.parse_if(tag_root, tag_highlight, tag_background)?;
            return Ok(if disabled { None } else { Some(inst) });
        }
        let args = self.parse_arg_list()?;
        let children = self.parse_block_or_statement_list()?;
        self.maybe_eat_trailing_semi();
        if disabled {
            return Ok(None);
        }
        Ok(Some(
            ModuleInstanciation::new(name, args)
                .with_children(children)
                .tagged(tag_root, tag_highlight, tag_background),
        ))
    }

    /// `if (cond) stmt_or_block (else stmt_or_block)?` — modeled as an `if`
    /// instantiation whose `condition` argument is the parsed expression and
    /// whose `else` branch (if present) is a nested `else` instantiation
    /// among its own children, matching `builtins::control::eval_if`'s
    /// sentinel-child convention.
    fn parse_if(&mut self, tag_root: bool, tag_highlight: bool, tag_background: bool) -> PResult<ModuleInstanciation> {
        self.advance(); // 'if'
        self.eat(&Token::LParen)?;
        let condition = self.parse_expr()?;
        self.eat(&Token::RParen)?;
        let mut children = self.parse_block_or_statement_list()?;
        if let Token::Ident(kw) = self.peek() {
            if kw == "else" {
                self.advance();
                let else_children = self.parse_block_or_statement_list()?;
                children.push(ModuleInstanciation::new("else", vec![]).with_children(else_children));
            }
        }
        Ok(ModuleInstanciation::new("if", vec![Arg::named("condition", condition)])
            .with_children(children)
            .tagged(tag_root, tag_highlight, tag_background))
    }

    fn parse_block_or_statement_list(&mut self) -> PResult<Vec<ModuleInstanciation>> {
        match self.peek() {
            Token::LBrace => {
                self.advance();
                let mut children = Vec::new();
                while self.peek() != &Token::RBrace {
                    if let Some(inst) = self.parse_call_statement()? {
                        children.push(inst);
                    }
                }
                self.eat(&Token::RBrace)?;
                Ok(children)
            }
            Token::Semi => Ok(Vec::new()),
            _ => Ok(self.parse_call_statement()?.into_iter().collect()),
        }
    }

    fn maybe_eat_trailing_semi(&mut self) {
        if self.peek() == &Token::Semi {
            self.advance();
        }
    }

    // -- expressions, lowest to highest precedence ------------------------

    fn parse_expr(&mut self) -> PResult<Expression> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> PResult<Expression> {
        let cond = self.parse_or()?;
        if self.peek() == &Token::Question {
            self.advance();
            let then_e = self.parse_expr()?;
            self.eat(&Token::Colon)?;
            let else_e = self.parse_expr()?;
            return Ok(Expression::Ternary(Box::new(cond), Box::new(then_e), Box::new(else_e)));
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> PResult<Expression> {
        let mut lhs = self.parse_and()?;
        while self.peek() == &Token::OrOr {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expression::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expression> {
        let mut lhs = self.parse_comparison()?;
        while self.peek() == &Token::AndAnd {
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Expression::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> PResult<Expression> {
        let lhs = self.parse_additive()?;
        let ctor: fn(Box<Expression>, Box<Expression>) -> Expression = match self.peek() {
            Token::Eq => Expression::Eq,
            Token::Ne => Expression::Ne,
            Token::Le => Expression::Le,
            Token::Ge => Expression::Ge,
            Token::Lt => Expression::Lt,
            Token::Gt => Expression::Gt,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_additive()?;
        Ok(ctor(Box::new(lhs), Box::new(rhs)))
    }

    fn parse_additive(&mut self) -> PResult<Expression> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let ctor: fn(Box<Expression>, Box<Expression>) -> Expression = match self.peek() {
                Token::Plus => Expression::Add,
                Token::Minus => Expression::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = ctor(Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_multiplicative(&mut self) -> PResult<Expression> {
        let mut lhs = self.parse_unary()?;
        loop {
            let ctor: fn(Box<Expression>, Box<Expression>) -> Expression = match self.peek() {
                Token::Star => Expression::Mul,
                Token::Slash => Expression::Div,
                Token::Percent => Expression::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = ctor(Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> PResult<Expression> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                Ok(Expression::Negate(Box::new(self.parse_unary()?)))
            }
            Token::Bang => {
                self.advance();
                Ok(Expression::Not(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expression> {
        let mut e = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let member = self.ident()?;
                    e = Expression::LookupMember(Box::new(e), member);
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.eat(&Token::RBracket)?;
                    e = Expression::Index(Box::new(e), Box::new(index));
                }
                _ => return Ok(e),
            }
        }
    }

    fn parse_primary(&mut self) -> PResult<Expression> {
        match self.advance() {
            Token::Number(n) => Ok(Expression::Constant(Value::Number(n))),
            Token::Str(s) => Ok(Expression::Constant(Value::String(s))),
            Token::Dollar(name) => Ok(Expression::LookupVar(name)),
            Token::Ident(name) => {
                if name == "true" {
                    return Ok(Expression::Constant(Value::Bool(true)));
                }
                if name == "false" {
                    return Ok(Expression::Constant(Value::Bool(false)));
                }
                if name == "undef" {
                    return Ok(Expression::Constant(Value::Undefined));
                }
                if self.peek() == &Token::LParen {
                    let args = self.parse_arg_list()?;
                    return Ok(Expression::Call { name, args });
                }
                Ok(Expression::LookupVar(name))
            }
            Token::LParen => {
                let e = self.parse_expr()?;
                self.eat(&Token::RParen)?;
                Ok(e)
            }
            Token::LBracket => self.parse_vector_or_range(),
            other => Err(format!("unexpected token in expression: {other:?}")),
        }
    }

    /// `[a, b, c]` or `[begin:end]` / `[begin:step:end]`, dispatched on
    /// whether a `:` follows the first element.
    fn parse_vector_or_range(&mut self) -> PResult<Expression> {
        if self.peek() == &Token::RBracket {
            self.advance();
            return Ok(Expression::Vector(vec![]));
        }
        let first = self.parse_expr()?;
        if self.peek() == &Token::Colon {
            self.advance();
            let second = self.parse_expr()?;
            if self.peek() == &Token::Colon {
                self.advance();
                let third = self.parse_expr()?;
                self.eat(&Token::RBracket)?;
                return Ok(Expression::Range {
                    begin: Box::new(first),
                    step: Some(Box::new(second)),
                    end: Box::new(third),
                });
            }
            self.eat(&Token::RBracket)?;
            return Ok(Expression::Range {
                begin: Box::new(first),
                step: None,
                end: Box::new(second),
            });
        }
        let mut items = vec![first];
        while self.peek() == &Token::Comma {
            self.advance();
            if self.peek() == &Token::RBracket {
                break;
            }
            items.push(self.parse_expr()?);
        }
        self.eat(&Token::RBracket)?;
        Ok(Expression::Vector(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_cube_call() {
        let module = DemoParser.parse("cube(10);").expect("parses");
        assert_eq!(module.children.len(), 1);
        assert_eq!(module.children[0].modname, "cube");
    }

    #[test]
    fn parses_difference_block() {
        let module = DemoParser.parse("difference(){ cube(10); sphere(6); }").expect("parses");
        assert_eq!(module.children.len(), 1);
        assert_eq!(module.children[0].children.len(), 2);
    }

    #[test]
    fn parses_vector_and_translate() {
        let module = DemoParser.parse("translate([20,0,0]) cube(10);").expect("parses");
        assert_eq!(module.children[0].modname, "translate");
        assert_eq!(module.children[0].children.len(), 1);
    }

    #[test]
    fn parses_recursive_module_definition_and_call() {
        let module = DemoParser
            .parse("module r(n) { if (n>0) { cube(n); r(n-1); } } r(3);")
            .expect("parses");
        assert_eq!(module.children.len(), 1);
        assert_eq!(module.children[0].modname, "r");
    }

    #[test]
    fn background_tag_is_recorded() {
        let module = DemoParser.parse("% cube(5);").expect("parses");
        assert!(module.children[0].tag_background);
    }
}
