//! Recursive-descent compiler over the textbook Jack grammar.
//!
//! One [`CompilationEngine`] runs the *same* grammar-walking code twice
//! over the same buffered token stream (§4.5): pass 1 with the writer
//! silenced, populating only the class-level symbol table (statics,
//! fields, method-entries); pass 2 with the writer emitting, building a
//! fresh subroutine-local symbol table per subroutine as it goes. Class-
//! level declarations (`class.declare`, `class.declare_method`) are the
//! only thing gated on the pass -- everything else runs unconditionally,
//! relying on [`crate::vm_writer::VmWriter`]'s silent mode to make pass 1
//! a no-op everywhere else, exactly as the spec's VM Writer component
//! describes.

use std::path::Path;

use crate::error::CompileError;
use crate::symbol_table::{ClassSymbolTable, Kind, SubroutineSymbolTable};
use crate::token::{Keyword, Spanned, Token};
use crate::tokenizer::Tokenizer;
use crate::vm_writer::VmWriter;
use std::collections::HashSet;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Populate the class-level symbol table; the writer is silenced.
    Discover,
    /// Emit VM code, reusing the class-level table pass 1 built.
    Emit,
}

/// Extracts the class name from `class Name { ... }` without running the
/// full grammar -- every `.jack` file is exactly one class, so the name is
/// always the second token. Used by the directory-mode driver to build the
/// cross-file "known class names" set before compiling any single file.
#[must_use]
pub fn class_name_of(tokens: &[Spanned]) -> Option<String> {
    match (tokens.first().map(|s| &s.token), tokens.get(1).map(|s| &s.token)) {
        (Some(Token::Keyword(Keyword::Class)), Some(Token::Identifier(name))) => Some(name.clone()),
        _ => None,
    }
}

/// Compiles one already-tokenized `.jack` unit to its sibling `.vm` file.
///
/// `siblings` is the set of class names known in this compilation (the OS
/// classes plus every class discovered across the directory being
/// compiled), used to resolve the `X.member(...)` ambiguity in §4.5.3.
pub fn compile_class_tokens(
    tokens: Vec<Spanned>,
    class_name: &str,
    siblings: &HashSet<String>,
    output: &Path,
) -> Result<(), CompileError> {
    let mut class = ClassSymbolTable::new(class_name, siblings);

    let mut discover = CompilationEngine::new(Tokenizer::new(tokens.clone()), VmWriter::silent(), Pass::Discover);
    discover.compile_class(&mut class)?;

    let mut emit = CompilationEngine::new(Tokenizer::new(tokens), VmWriter::emitting(output)?, Pass::Emit);
    emit.compile_class(&mut class)?;
    emit.writer.close()?;
    Ok(())
}

struct CompilationEngine {
    tokens: Tokenizer,
    writer: VmWriter,
    pass: Pass,
    if_counter: u32,
    while_counter: u32,
}

impl CompilationEngine {
    fn new(mut tokens: Tokenizer, writer: VmWriter, pass: Pass) -> Self {
        tokens.has_next();
        Self { tokens, writer, pass, if_counter: 0, while_counter: 0 }
    }

    fn cur(&self) -> &Token {
        self.tokens.current()
    }

    fn line(&self) -> usize {
        self.tokens.line_number()
    }

    /// Advances past the current token. Must only be called once a grammar
    /// rule has matched it against the expected form.
    fn bump(&mut self) {
        self.tokens.has_next();
    }

    fn at_symbol(&self, c: char) -> bool {
        matches!(self.cur(), Token::Symbol(s) if *s == c)
    }

    fn at_keyword(&self, k: Keyword) -> bool {
        matches!(self.cur(), Token::Keyword(kw) if *kw == k)
    }

    fn eat_symbol(&mut self, c: char) -> Result<(), CompileError> {
        if self.at_symbol(c) {
            self.bump();
            Ok(())
        } else {
            Err(CompileError::syntax(
                self.line(),
                format!("expected '{c}', found '{}'", self.cur().describe()),
            ))
        }
    }

    fn eat_keyword(&mut self, k: Keyword) -> Result<(), CompileError> {
        if self.at_keyword(k) {
            self.bump();
            Ok(())
        } else {
            Err(CompileError::syntax(
                self.line(),
                format!("expected '{}', found '{}'", k.as_str(), self.cur().describe()),
            ))
        }
    }

    fn eat_identifier(&mut self) -> Result<String, CompileError> {
        match self.cur().clone() {
            Token::Identifier(name) => {
                self.bump();
                Ok(name)
            }
            other => Err(CompileError::syntax(
                self.line(),
                format!("expected identifier, found '{}'", other.describe()),
            )),
        }
    }

    /// `int | char | boolean | ClassName`, for field/var/parameter types.
    fn eat_type(&mut self) -> Result<String, CompileError> {
        match self.cur().clone() {
            Token::Keyword(Keyword::Int) => {
                self.bump();
                Ok("int".to_string())
            }
            Token::Keyword(Keyword::Char) => {
                self.bump();
                Ok("char".to_string())
            }
            Token::Keyword(Keyword::Boolean) => {
                self.bump();
                Ok("boolean".to_string())
            }
            Token::Identifier(name) => {
                self.bump();
                Ok(name)
            }
            other => Err(CompileError::syntax(
                self.line(),
                format!("expected a type, found '{}'", other.describe()),
            )),
        }
    }

    /// `void | type`, for subroutine return types.
    fn eat_return_type(&mut self) -> Result<String, CompileError> {
        if self.at_keyword(Keyword::Void) {
            self.bump();
            Ok("void".to_string())
        } else {
            self.eat_type()
        }
    }

    fn push_variable(&mut self, scope: &SubroutineSymbolTable, name: &str) -> Result<(), CompileError> {
        let sym = scope
            .resolve(name)
            .ok_or_else(|| CompileError::semantic(self.line(), format!("undefined identifier '{name}'")))?;
        self.writer.write_push(sym.kind.segment(), sym.index)?;
        Ok(())
    }

    fn pop_variable(&mut self, scope: &SubroutineSymbolTable, name: &str) -> Result<(), CompileError> {
        let sym = scope
            .resolve(name)
            .ok_or_else(|| CompileError::semantic(self.line(), format!("undefined identifier '{name}'")))?;
        self.writer.write_pop(sym.kind.segment(), sym.index)?;
        Ok(())
    }

    fn at_class_var_dec(&self) -> bool {
        self.at_keyword(Keyword::Static) || self.at_keyword(Keyword::Field)
    }

    fn at_subroutine_dec(&self) -> bool {
        self.at_keyword(Keyword::Constructor) || self.at_keyword(Keyword::Function) || self.at_keyword(Keyword::Method)
    }

    fn at_var_dec(&self) -> bool {
        self.at_keyword(Keyword::Var)
    }

    fn compile_class(&mut self, class: &mut ClassSymbolTable) -> Result<(), CompileError> {
        self.eat_keyword(Keyword::Class)?;
        self.eat_identifier()?; // the class name; already known from the prescan
        self.eat_symbol('{')?;

        while self.at_class_var_dec() {
            self.compile_class_var_dec(class)?;
        }
        while self.at_subroutine_dec() {
            self.compile_subroutine_dec(class)?;
        }

        self.eat_symbol('}')
    }

    fn compile_class_var_dec(&mut self, class: &mut ClassSymbolTable) -> Result<(), CompileError> {
        let kind = if self.at_keyword(Keyword::Static) { Kind::Static } else { Kind::Field };
        self.bump();
        let type_name = self.eat_type()?;

        loop {
            let name = self.eat_identifier()?;
            if self.pass == Pass::Discover {
                class.declare(&name, &type_name, kind);
            }
            if self.at_symbol(',') {
                self.bump();
            } else {
                break;
            }
        }
        self.eat_symbol(';')
    }

    fn compile_subroutine_dec(&mut self, class: &mut ClassSymbolTable) -> Result<(), CompileError> {
        let sub_kind = match self.cur() {
            Token::Keyword(k @ (Keyword::Constructor | Keyword::Function | Keyword::Method)) => *k,
            _ => unreachable!("guarded by at_subroutine_dec"),
        };
        self.bump();
        self.eat_return_type()?;
        let name = self.eat_identifier()?;

        if self.pass == Pass::Discover && sub_kind == Keyword::Method {
            class.declare_method(&name);
        }

        self.eat_symbol('(')?;
        let mut scope = SubroutineSymbolTable::new(&*class);
        if sub_kind == Keyword::Method {
            scope.declare("this", &class.name.clone(), Kind::Argument);
        }
        self.compile_parameter_list(&mut scope)?;
        self.eat_symbol(')')?;

        self.eat_symbol('{')?;
        while self.at_var_dec() {
            self.compile_var_dec(&mut scope)?;
        }

        // nLocals is now known (every `var` precedes the first statement),
        // so the prologue is flushed directly instead of queued (see the
        // spec's DESIGN NOTES on the deferred-action-queue redesign).
        let full_name = format!("{}.{name}", scope.class_scope().name);
        self.writer.write_function(&full_name, scope.var_count())?;
        match sub_kind {
            Keyword::Constructor => {
                self.writer.write_push("constant", scope.class_scope().field_count())?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop("pointer", 0)?;
            }
            Keyword::Method => {
                self.writer.write_push("argument", 0)?;
                self.writer.write_pop("pointer", 0)?;
            }
            Keyword::Function => {}
            _ => unreachable!(),
        }

        self.if_counter = 0;
        self.while_counter = 0;
        self.compile_statements(&scope)?;
        self.eat_symbol('}')
    }

    fn compile_parameter_list(&mut self, scope: &mut SubroutineSymbolTable) -> Result<(), CompileError> {
        if self.at_symbol(')') {
            return Ok(());
        }
        loop {
            let type_name = self.eat_type()?;
            let name = self.eat_identifier()?;
            scope.declare(&name, &type_name, Kind::Argument);
            if self.at_symbol(',') {
                self.bump();
            } else {
                break;
            }
        }
        Ok(())
    }

    fn compile_var_dec(&mut self, scope: &mut SubroutineSymbolTable) -> Result<(), CompileError> {
        self.eat_keyword(Keyword::Var)?;
        let type_name = self.eat_type()?;
        loop {
            let name = self.eat_identifier()?;
            scope.declare(&name, &type_name, Kind::Var);
            if self.at_symbol(',') {
                self.bump();
            } else {
                break;
            }
        }
        self.eat_symbol(';')
    }

    fn compile_statements(&mut self, scope: &SubroutineSymbolTable) -> Result<(), CompileError> {
        loop {
            match self.cur() {
                Token::Keyword(Keyword::Let) => self.compile_let(scope)?,
                Token::Keyword(Keyword::If) => self.compile_if(scope)?,
                Token::Keyword(Keyword::While) => self.compile_while(scope)?,
                Token::Keyword(Keyword::Do) => self.compile_do(scope)?,
                Token::Keyword(Keyword::Return) => self.compile_return(scope)?,
                _ => break,
            }
        }
        Ok(())
    }

    fn compile_let(&mut self, scope: &SubroutineSymbolTable) -> Result<(), CompileError> {
        self.eat_keyword(Keyword::Let)?;
        let name = self.eat_identifier()?;

        if self.at_symbol('[') {
            self.bump();
            self.push_variable(scope, &name)?;
            self.compile_expression(scope)?;
            self.eat_symbol(']')?;
            self.writer.write_arithmetic("add")?;

            self.eat_symbol('=')?;
            self.compile_expression(scope)?;
            self.eat_symbol(';')?;

            // RHS is on top of [..., address]; stash it before clobbering
            // `pointer 1` with the address, so it can't be overwritten by
            // evaluating the RHS (§4.5.4).
            self.writer.write_pop("temp", 0)?;
            self.writer.write_pop("pointer", 1)?;
            self.writer.write_push("temp", 0)?;
            self.writer.write_pop("that", 0)?;
        } else {
            self.eat_symbol('=')?;
            self.compile_expression(scope)?;
            self.eat_symbol(';')?;
            self.pop_variable(scope, &name)?;
        }
        Ok(())
    }

    fn compile_if(&mut self, scope: &SubroutineSymbolTable) -> Result<(), CompileError> {
        self.eat_keyword(Keyword::If)?;
        self.eat_symbol('(')?;
        self.compile_expression(scope)?;
        self.eat_symbol(')')?;

        let k = self.if_counter;
        self.if_counter += 1;
        let true_label = format!("IF_TRUE_{k}");
        let false_label = format!("IF_FALSE_{k}");
        let end_label = format!("IF_END_{k}");

        self.writer.write_if(&true_label)?;
        self.writer.write_goto(&false_label)?;
        self.writer.write_label(&true_label)?;

        self.eat_symbol('{')?;
        self.compile_statements(scope)?;
        self.eat_symbol('}')?;

        if self.at_keyword(Keyword::Else) {
            self.bump();
            self.writer.write_goto(&end_label)?;
            self.writer.write_label(&false_label)?;
            self.eat_symbol('{')?;
            self.compile_statements(scope)?;
            self.eat_symbol('}')?;
            self.writer.write_label(&end_label)?;
        } else {
            self.writer.write_label(&false_label)?;
        }
        Ok(())
    }

    fn compile_while(&mut self, scope: &SubroutineSymbolTable) -> Result<(), CompileError> {
        self.eat_keyword(Keyword::While)?;

        let k = self.while_counter;
        self.while_counter += 1;
        let exp_label = format!("WHILE_EXP_{k}");
        let end_label = format!("WHILE_END_{k}");

        self.writer.write_label(&exp_label)?;
        self.eat_symbol('(')?;
        self.compile_expression(scope)?;
        self.eat_symbol(')')?;
        self.writer.write_arithmetic("not")?;
        self.writer.write_if(&end_label)?;

        self.eat_symbol('{')?;
        self.compile_statements(scope)?;
        self.eat_symbol('}')?;

        self.writer.write_goto(&exp_label)?;
        self.writer.write_label(&end_label)
    }

    fn compile_do(&mut self, scope: &SubroutineSymbolTable) -> Result<(), CompileError> {
        self.eat_keyword(Keyword::Do)?;
        let name = self.eat_identifier()?;
        self.compile_call(scope, name)?;
        self.eat_symbol(';')?;
        // Jack subroutines always return a value; `do` discards it.
        self.writer.write_pop("temp", 0)
    }

    fn compile_return(&mut self, scope: &SubroutineSymbolTable) -> Result<(), CompileError> {
        self.eat_keyword(Keyword::Return)?;
        if self.at_symbol(';') {
            self.writer.write_push("constant", 0)?;
        } else {
            self.compile_expression(scope)?;
        }
        self.eat_symbol(';')?;
        self.writer.write_return()
    }

    fn compile_expression(&mut self, scope: &SubroutineSymbolTable) -> Result<(), CompileError> {
        self.compile_term(scope)?;
        loop {
            let op = match self.cur() {
                Token::Symbol(c @ ('+' | '-' | '*' | '/' | '&' | '|' | '<' | '>' | '=')) => *c,
                _ => break,
            };
            self.bump();
            self.compile_term(scope)?;
            match op {
                '+' => self.writer.write_arithmetic("add")?,
                '-' => self.writer.write_arithmetic("sub")?,
                '*' => self.writer.write_call("Math.multiply", 2)?,
                '/' => self.writer.write_call("Math.divide", 2)?,
                '&' => self.writer.write_arithmetic("and")?,
                '|' => self.writer.write_arithmetic("or")?,
                '<' => self.writer.write_arithmetic("lt")?,
                '>' => self.writer.write_arithmetic("gt")?,
                '=' => self.writer.write_arithmetic("eq")?,
                _ => unreachable!(),
            }
        }
        Ok(())
    }

    fn compile_term(&mut self, scope: &SubroutineSymbolTable) -> Result<(), CompileError> {
        match self.cur().clone() {
            Token::IntConst(n) => {
                self.bump();
                self.writer.write_push("constant", n)?;
            }
            Token::StringConst(s) => {
                self.bump();
                self.writer.write_push("constant", s.len() as u16)?;
                self.writer.write_call("String.new", 1)?;
                for byte in s.bytes() {
                    self.writer.write_push("constant", u16::from(byte))?;
                    self.writer.write_call("String.appendChar", 2)?;
                }
            }
            Token::Keyword(Keyword::True) => {
                self.bump();
                self.writer.write_push("constant", 0)?;
                self.writer.write_arithmetic("not")?;
            }
            Token::Keyword(Keyword::False | Keyword::Null) => {
                self.bump();
                self.writer.write_push("constant", 0)?;
            }
            Token::Keyword(Keyword::This) => {
                self.bump();
                self.writer.write_push("pointer", 0)?;
            }
            Token::Symbol('(') => {
                self.bump();
                self.compile_expression(scope)?;
                self.eat_symbol(')')?;
            }
            Token::Symbol(c @ ('-' | '~')) => {
                self.bump();
                self.compile_term(scope)?;
                self.writer.write_arithmetic(if c == '-' { "neg" } else { "not" })?;
            }
            Token::Identifier(name) => {
                self.bump();
                match self.cur() {
                    Token::Symbol('[') => {
                        self.bump();
                        self.push_variable(scope, &name)?;
                        self.compile_expression(scope)?;
                        self.eat_symbol(']')?;
                        self.writer.write_arithmetic("add")?;
                        self.writer.write_pop("pointer", 1)?;
                        self.writer.write_push("that", 0)?;
                    }
                    Token::Symbol('.') | Token::Symbol('(') => {
                        self.compile_call(scope, name)?;
                    }
                    _ => self.push_variable(scope, &name)?,
                }
            }
            other => {
                return Err(CompileError::syntax(
                    self.line(),
                    format!("expected a term, found '{}'", other.describe()),
                ))
            }
        }
        Ok(())
    }

    /// Resolves and emits one `subroutineCall`, per §4.5.3. `name` is the
    /// identifier already consumed before the dispatch on `.`/`(`.
    fn compile_call(&mut self, scope: &SubroutineSymbolTable, name: String) -> Result<(), CompileError> {
        if self.at_symbol('.') {
            self.bump();
            let member = self.eat_identifier()?;

            if scope.class_scope().is_known_class(&name) {
                self.eat_symbol('(')?;
                let n_args = self.compile_expression_list(scope)?;
                self.eat_symbol(')')?;
                self.writer.write_call(&format!("{name}.{member}"), n_args)?;
            } else {
                let (segment, index, type_name) = {
                    let sym = scope.resolve(&name).ok_or_else(|| {
                        CompileError::semantic(self.line(), format!("undefined identifier '{name}'"))
                    })?;
                    (sym.kind.segment(), sym.index, sym.type_name.clone())
                };
                self.writer.write_push(segment, index)?;
                self.eat_symbol('(')?;
                let n_args = self.compile_expression_list(scope)?;
                self.eat_symbol(')')?;
                self.writer.write_call(&format!("{type_name}.{member}"), n_args + 1)?;
            }
        } else {
            self.writer.write_push("pointer", 0)?;
            self.eat_symbol('(')?;
            let n_args = self.compile_expression_list(scope)?;
            self.eat_symbol(')')?;
            self.writer
                .write_call(&format!("{}.{name}", scope.class_scope().name), n_args + 1)?;
        }
        Ok(())
    }

    fn compile_expression_list(&mut self, scope: &SubroutineSymbolTable) -> Result<u16, CompileError> {
        if self.at_symbol(')') {
            return Ok(0);
        }
        let mut count = 1u16;
        self.compile_expression(scope)?;
        while self.at_symbol(',') {
            self.bump();
            self.compile_expression(scope)?;
            count += 1;
        }
        Ok(count)
    }
}
