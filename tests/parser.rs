#[cfg(test)]
mod parser_tests {
    use nad_interpreter as nad;

    use nad::ast::{Expr, Stmt};
    use nad::ast_printer::AstPrinter;
    use nad::parser::Parser;
    use nad::scanner::Scanner;
    use nad::token::Token;

    fn tokens(source: &str) -> Vec<Token> {
        Scanner::new(source).filter_map(Result::ok).collect()
    }

    fn parse(source: &str) -> Vec<Stmt> {
        match Parser::new(tokens(source)).parse() {
            Ok(statements) => statements,
            Err(errors) => panic!("unexpected parse errors: {:?}", errors),
        }
    }

    fn printed(source: &str) -> String {
        AstPrinter::print_program(&parse(source))
    }

    fn errors(source: &str) -> Vec<String> {
        match Parser::new(tokens(source)).parse() {
            Ok(statements) => panic!("expected errors, parsed {:?}", statements),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(printed("print 1 + 2 * 3;"), "(print (+ 1.0 (* 2.0 3.0)))");
        assert_eq!(printed("print -2 % 3 - 1;"), "(print (- (% (- 2.0) 3.0) 1.0))");
        assert_eq!(printed("!!x;"), "(; (! (! x)))");
    }

    #[test]
    fn test_equality_binds_looser_than_logical() {
        assert_eq!(printed("a == b || c;"), "(; (== a (|| b c)))");
        assert_eq!(printed("a || b && c < d;"), "(; (|| a (&& b (< c d))))");
    }

    #[test]
    fn test_ternary_is_right_associative() {
        assert_eq!(printed("a ? b : c ? d : e;"), "(; (?: a b (?: c d e)))");
    }

    #[test]
    fn test_comma_and_assignment() {
        assert_eq!(printed("a, b = 1;"), "(; (, a (= b 1.0)))");
        assert_eq!(printed("a = b = 2;"), "(; (= a (= b 2.0)))");
        assert_eq!(printed("x += 1;"), "(; (+= x 1.0))");
        assert_eq!(printed("o.f -= 2;"), "(; (-= (. o f) 2.0))");
        assert_eq!(printed("f(1, 2).g = 3;"), "(; (= (. (call f 1.0 2.0) g) 3.0))");
    }

    #[test]
    fn test_var_without_initializer_is_nil() {
        assert_eq!(printed("var a;"), "(var a nil)");
    }

    #[test]
    fn test_for_desugars_to_while_with_increment() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i += 1) print i;"),
            "(block (var i 0.0) (while (< i 3.0) (print i) (+= i 1.0)))"
        );
        assert_eq!(printed("for (;;) break;"), "(block (while true (break)))");
    }

    #[test]
    fn test_functions_and_classes() {
        assert_eq!(
            printed("func add(a, b) { return a + b; }"),
            "(func add (a b) (block (return (+ a b))))"
        );
        assert_eq!(
            printed("func () { return 1; }();"),
            "(; (call (func () (block (return 1.0)))))"
        );
        assert_eq!(
            printed("class B < A { init(x) { this.x = x; } }"),
            "(class B < A (method init (x) (block (; (= (. this x) x)))))"
        );
        assert_eq!(printed("super.go;"), "(; (super go))");
    }

    #[test]
    fn test_stray_semicolons_are_skipped() {
        assert_eq!(printed(";;print 1;;"), "(print 1.0)");
        assert_eq!(printed("if (a) ; else print 2;"), "(if a (block) (print 2.0))");
    }

    #[test]
    fn test_superclass_and_names_get_ids() {
        let statements = parse("class B < A {}");

        match &statements[0] {
            Stmt::Class {
                superclass: Some(Expr::Variable { name, .. }),
                ..
            } => assert_eq!(name.lexeme, "A"),
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_expression_ids_continue_from_first_id() {
        let mut parser = Parser::with_first_id(tokens("a; b = c; this;"), 40);
        let statements = parser.parse().expect("valid program");

        assert_eq!(statements.len(), 3);
        // a, (b =) , c, this
        assert_eq!(parser.next_id(), 44);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            errors("var = 1;"),
            vec!["On line 1, at '=': Missing identifier after the keyword 'var'."]
        );
        assert_eq!(
            errors("print;"),
            vec!["On line 1, at ';': Expect an expression."]
        );
        assert_eq!(
            errors("1 = 2;"),
            vec!["On line 1, at '=': Invalid left-hand side in the assignment expression."]
        );
        assert_eq!(
            errors("static;"),
            vec!["On line 1, at 'static': 'static' is a reserved keyword."]
        );
        assert_eq!(
            errors("print 1"),
            vec!["On line 1, at end: Expect ';' after value."]
        );
        assert_eq!(
            errors("a ? b;"),
            vec!["On line 1, at ';': Expect ':' in the ternary expression."]
        );
    }

    #[test]
    fn test_recovery_reports_every_statement() {
        assert_eq!(
            errors("var = 1;\nprint;\nprint 3;\n{ print 4;"),
            vec![
                "On line 1, at '=': Missing identifier after the keyword 'var'.",
                "On line 2, at ';': Expect an expression.",
                "On line 4, at end: Expect '}' after block.",
            ]
        );
    }

    #[test]
    fn test_argument_limit() {
        let args: Vec<String> = (1..=21).map(|n| n.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        assert_eq!(
            errors(&source),
            vec!["On line 1, at '21': Function call can accept no more than 20 arguments."]
        );
    }
}
