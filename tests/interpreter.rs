mod common;

#[cfg(test)]
mod interpreter_tests {
    use super::common::{capture, on_interpreter_stack, output_of, run_file};

    use nad_interpreter::diagnostics::{EXIT_RUNTIME_ERROR, EXIT_SYNTAX_ERROR};
    use nad_interpreter::session::Mode;

    #[test]
    fn test_block_scoped_closure() {
        let source = "var a = 1;\n{\n  var a = 2;\n  func show() { print a; }\n  show();\n}";
        assert_eq!(output_of(source), vec!["2"]);
    }

    #[test]
    fn test_recursive_fibonacci() {
        let source = "func fib(n) { if (n < 2) return n; return fib(n-1) + fib(n-2); }\nprint fib(10);";
        assert_eq!(output_of(source), vec!["55"]);
    }

    #[test]
    fn test_super_method_call() {
        let source = r#"
            class A { greet() { print "A"; } }
            class B < A { greet() { super.greet(); print "B"; } }
            B().greet();
        "#;
        assert_eq!(output_of(source), vec!["A", "B"]);
    }

    #[test]
    fn test_super_resolves_on_the_enclosing_class() {
        let source = r#"
            class A { m() { print "A"; } }
            class B < A { m() { print "B"; super.m(); } }
            class C < B {}
            C().m();
        "#;
        assert_eq!(output_of(source), vec!["B", "A"]);
    }

    #[test]
    fn test_inherited_initializer_sets_arity() {
        let source = r#"
            class D { init(a, b) { this.sum = a + b; } }
            class E < D {}
            print E(1, 2).sum;
        "#;
        assert_eq!(output_of(source), vec!["3"]);

        let outcome = run_file("class D { init(a, b) {} }\nclass E < D {}\nE(1);");
        assert_eq!(
            outcome.diagnostics,
            vec!["On line 3, token ')': Expect 2 arguments but found 1 arguments."]
        );
        assert_eq!(outcome.exit_code, EXIT_RUNTIME_ERROR);
    }

    #[test]
    fn test_local_without_initializer_reads_nil() {
        assert_eq!(output_of("{ var n; print n; }"), vec!["nil"]);
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_eq!(output_of("print clock() > 0;"), vec!["true"]);
    }

    #[test]
    fn test_constructor_sets_fields() {
        let source = "class P { init(x) { this.x = x; } }\nvar p = P(7); print p.x;";
        assert_eq!(output_of(source), vec!["7"]);
    }

    #[test]
    fn test_initializer_always_returns_receiver() {
        let source = r#"
            class C { init() { return; } }
            print C();
            var c = C();
            print c.init() == c;
        "#;
        assert_eq!(output_of(source), vec!["<instance of 'C'>", "true"]);
    }

    #[test]
    fn test_break_skips_increment_and_continue_runs_it() {
        let source = r#"
            for (var i = 0; i < 5; i = i + 1) {
              if (i == 2) break;
              print i;
            }
            for (var j = 0; j < 4; j += 1) {
              if (j == 1) continue;
              print j;
            }
        "#;
        assert_eq!(output_of(source), vec!["0", "1", "0", "2", "3"]);
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let source = r#"
            print nil || "x";
            print 0 && "y";
            print false && undefined;
            print "a" || undefined;
        "#;
        assert_eq!(output_of(source), vec!["x", "y", "false", "a"]);
    }

    #[test]
    fn test_closures_capture_by_reference() {
        let source = r#"
            func counter() {
              var n = 0;
              func inc() { n += 1; return n; }
              return inc;
            }
            var c = counter();
            c();
            print c();

            var shared = 1;
            func bump() { shared = shared + 10; }
            bump();
            print shared;
        "#;
        assert_eq!(output_of(source), vec!["2", "11"]);
    }

    #[test]
    fn test_value_rendering() {
        let source = r#"
            print 3;
            print 2.5;
            print 1 / 0;
            print -1 / 0;
            print -0;
            print nil;
            print true;
            print "raw text";
            func named() {}
            print named;
            print func () {};
            print clock;
            class K {}
            print K;
            print K();
        "#;
        assert_eq!(
            output_of(source),
            vec![
                "3",
                "2.5",
                "inf",
                "-inf",
                "-0",
                "nil",
                "true",
                "raw text",
                "<function named>",
                "<anonymous function>",
                "<native fn>",
                "<class 'K'>",
                "<instance of 'K'>",
            ]
        );
    }

    #[test]
    fn test_operators() {
        let source = r#"
            print 7 % 3;
            print "ab" + "cd";
            print 1 <= 2;
            print 2 >= 3;
            print 1 == 1, 2;
            print nil == false;
            print "a" == "a";
            print true ? 1 : 2;
            print 1 ? 1 : 2;
            var s = "x";
            s += "y";
            print s;
        "#;
        assert_eq!(
            output_of(source),
            vec!["1", "abcd", "true", "false", "2", "false", "true", "1", "2", "xy"]
        );
    }

    #[test]
    fn test_ternary_evaluates_only_the_chosen_branch() {
        let source = r#"
            var hits = 0;
            func hit() { hits += 1; return hits; }
            var r = true ? hit() : hit();
            print hits;
        "#;
        assert_eq!(output_of(source), vec!["1"]);
    }

    #[test]
    fn test_inheritance_and_property_compound_assignment() {
        let source = r#"
            class Base {
              init(n) { this.n = n; }
              describe() { return "n=" + this.label(); }
              label() { return "base"; }
            }
            class Derived < Base {
              label() { return "derived"; }
            }
            var d = Derived(3);
            d.n += 4;
            print d.n;
            print d.describe();
        "#;
        assert_eq!(output_of(source), vec!["7", "n=derived"]);
    }

    #[test]
    fn test_methods_bind_this() {
        let source = r#"
            class Box {
              init(v) { this.v = v; }
              get() { return this.v; }
            }
            var g = Box("kept").get;
            print g();
        "#;
        assert_eq!(output_of(source), vec!["kept"]);
    }

    #[test]
    fn test_runtime_errors_are_reported_with_exit_code() {
        let cases = [
            ("print 1 + \"a\";", "On line 1, token '+': Both operands must be either strings or numerics"),
            ("print -\"a\";", "On line 1, token '-': Missing a numeric operand"),
            ("print 1 < nil;", "On line 1, token '<': Both operands must be numeric"),
            ("print missing;", "On line 1, token 'missing': Dereference an undefined variable."),
            ("missing = 1;", "On line 1, token 'missing': Assign value to an undefined variable."),
            ("var x = 1; var x = 2;", "On line 1, token 'x': Redeclare existing variable: \"x\"."),
            ("\"str\"();", "On line 1, token ')': The expression before '(' is not callable."),
            ("func f(a) {}\nf(1, 2);", "On line 2, token ')': Expect 1 arguments but found 2 arguments."),
            ("var n = 1; print n.x;", "On line 1, token 'x': Invalid field access."),
            ("var n = 1; n.x = 2;", "On line 1, token 'x': Only objects have properties."),
            ("class A {} print A().nope;", "On line 1, token 'nope': property 'nope' does not exist."),
            ("var N = 1; class B < N {}", "On line 1, token 'N': 'N' is not a class."),
            (
                "class A {} class B < A { m() { return super.nope; } } B().m();",
                "On line 1, token 'super': The superclass does not own method 'nope'.",
            ),
        ];

        for (source, message) in cases {
            let outcome = run_file(source);
            assert_eq!(outcome.diagnostics, vec![message], "{}", source);
            assert_eq!(outcome.exit_code, EXIT_RUNTIME_ERROR, "{}", source);
        }
    }

    #[test]
    fn test_runtime_error_stops_the_program() {
        let outcome = run_file("print 1;\nprint nil + 1;\nprint 2;");

        assert_eq!(outcome.output, vec!["1"]);
        assert_eq!(outcome.exit_code, EXIT_RUNTIME_ERROR);
    }

    #[test]
    fn test_syntax_errors_skip_execution() {
        let outcome = run_file("print 1;\nprint 2\n");

        assert!(outcome.output.is_empty());
        assert_eq!(outcome.diagnostics, vec!["On line 3, at end: Expect ';' after value."]);
        assert_eq!(outcome.exit_code, EXIT_SYNTAX_ERROR);

        let outcome = run_file("print 1; $");
        assert!(outcome.output.is_empty());
        assert_eq!(outcome.diagnostics, vec!["On line 1, : Invalid character '$'."]);
        assert_eq!(outcome.exit_code, EXIT_SYNTAX_ERROR);

        let outcome = run_file("print 1; return 2;");
        assert!(outcome.output.is_empty());
        assert_eq!(outcome.exit_code, EXIT_SYNTAX_ERROR);
    }

    #[test]
    fn test_lexical_error_stops_before_parsing() {
        let outcome = run_file("var x = $;");

        assert!(outcome.output.is_empty());
        assert_eq!(outcome.diagnostics, vec!["On line 1, : Invalid character '$'."]);
        assert_eq!(outcome.exit_code, EXIT_SYNTAX_ERROR);
    }

    #[test]
    fn test_deep_recursion_is_bounded() {
        let (output, diagnostics, exit_code) = on_interpreter_stack(|| {
            let (mut session, out, diagnostics) = capture(Mode::Interactive);
            let count = "func count(n) { if (n == 0) return 0; return count(n - 1) + 1; }";

            session.run(count);
            session.run("print count(900);");
            session.run("print count(100000);");
            let exit_code = session.exit_code();
            session.reset();

            // the depth counter unwinds with the error
            session.run("print count(10);");

            (out.lines(), diagnostics.lines(), exit_code)
        });

        assert_eq!(output, vec!["900", "10"]);
        assert_eq!(diagnostics, vec!["On line 1, token ')': Stack overflow."]);
        assert_eq!(exit_code, EXIT_RUNTIME_ERROR);
    }

    #[test]
    fn test_file_mode_does_not_echo_expressions() {
        let outcome = run_file("1 + 2;");

        assert!(outcome.output.is_empty());
        assert_eq!(outcome.exit_code, 0);
    }

    #[test]
    fn test_prompt_echoes_and_keeps_globals_across_lines() {
        let (mut session, out, diagnostics) = capture(Mode::Interactive);

        for line in ["var a = 40;", "a + 2;", "{ a; }", "print a;"] {
            session.run(line);
            session.reset();
        }

        assert_eq!(out.lines(), vec!["42", "40"]);
        assert!(diagnostics.lines().is_empty());
    }

    #[test]
    fn test_prompt_recovers_after_errors() {
        let (mut session, out, diagnostics) = capture(Mode::Interactive);

        session.run("func boom() { { var inner = 1; return nil - 1; } }");
        session.reset();

        session.run("boom();");
        assert_eq!(session.exit_code(), EXIT_RUNTIME_ERROR);
        session.reset();
        assert_eq!(session.exit_code(), 0);

        session.run("var after = 5;");
        session.reset();
        session.run("after;");
        session.reset();

        session.run("print;");
        session.reset();
        session.run("after;");

        assert_eq!(out.lines(), vec!["5", "5"]);
        assert_eq!(
            diagnostics.lines(),
            vec![
                "On line 1, token '-': Both operands must be numeric",
                "On line 1, at ';': Expect an expression.",
            ]
        );
    }
}
