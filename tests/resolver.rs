mod common;

#[cfg(test)]
mod resolver_tests {
    use std::io;

    use super::common::SharedBuffer;

    use nad_interpreter as nad;

    use nad::ast::Stmt;
    use nad::interpreter::Interpreter;
    use nad::parser::Parser;
    use nad::resolver::Resolver;
    use nad::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens = Scanner::new(source).filter_map(Result::ok).collect();
        Parser::new(tokens).parse().expect("valid syntax")
    }

    fn resolve_errors(source: &str) -> Vec<String> {
        let statements = parse(source);
        let mut interpreter = Interpreter::with_output(Box::new(io::sink()));

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_programs_resolve_cleanly() {
        let programs = [
            "var a = 1; var a = 2;",
            "func f(n) { if (n < 2) return n; return f(n - 1); }",
            "class A { init() { return; } m() { return this; } }",
            "class A { init() { return nil; } }",
            "class A {} class B < A { m() { return super.m; } }",
            "while (true) { if (true) break; continue; }",
            "for (var i = 0; i < 3; i += 1) { var i = 2; }",
            "{ var a = 1; { var b = a; } }",
        ];

        for program in programs {
            assert_eq!(resolve_errors(program), Vec::<String>::new(), "{}", program);
        }
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["On line 1, at 'return': 'return' statement outside function definition."]
        );
    }

    #[test]
    fn test_local_redeclaration() {
        assert_eq!(
            resolve_errors("{ var a = 1;\n var a = 2; }"),
            vec!["On line 2, at 'a': Redeclaration of variable."]
        );
        assert_eq!(
            resolve_errors("func f(a, a) {}"),
            vec!["On line 1, at 'a': Redeclaration of variable."]
        );
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            resolve_errors("{ var a = a; }"),
            vec!["On line 1, at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_this_and_super_placement() {
        assert_eq!(
            resolve_errors("print this;"),
            vec!["On line 1, at 'this': 'this' outside class declaration."]
        );
        assert_eq!(
            resolve_errors("class A { m() { super.m(); } }"),
            vec!["On line 1, at 'super': Use of 'super' outside subclasses."]
        );
        assert_eq!(
            resolve_errors("func f() { return super.x; }"),
            vec!["On line 1, at 'super': Use of 'super' outside subclasses."]
        );
    }

    #[test]
    fn test_self_inheritance() {
        assert_eq!(
            resolve_errors("class A < A {}"),
            vec!["On line 1, at 'A': A class is not allowed to inherit from itself."]
        );
    }

    #[test]
    fn test_initializer_return_value() {
        assert_eq!(
            resolve_errors("class A { init() { return 1; } }"),
            vec!["On line 1, at 'return': expect 'nil' as return value for the constructor."]
        );
    }

    #[test]
    fn test_jumps_outside_loop() {
        assert_eq!(
            resolve_errors("break;\ncontinue;"),
            vec![
                "On line 1, at 'break': 'break' outside loop.",
                "On line 2, at 'continue': 'continue' outside loop.",
            ]
        );
    }

    #[test]
    fn test_loop_context_does_not_leak_into_functions() {
        assert_eq!(
            resolve_errors("while (true) { func f() { break; } }"),
            vec!["On line 1, at 'break': 'break' outside loop."]
        );
    }

    #[test]
    fn test_resolving_twice_is_stable() {
        let statements = parse(
            "{ var a = \"outer\"; { var b = a; func f() { return a + b; } print f(); } }",
        );
        let out = SharedBuffer::new();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));

        assert!(Resolver::new(&mut interpreter).resolve(&statements).is_ok());
        assert!(interpreter.interpret(&statements).is_ok());
        let first = out.contents();

        // the second pass records the same hop counts, so the program behaves the same
        assert!(Resolver::new(&mut interpreter).resolve(&statements).is_ok());
        assert!(interpreter.interpret(&statements).is_ok());

        assert_eq!(first, "outerouter\n");
        assert_eq!(out.contents(), "outerouter\nouterouter\n");
    }
}
