#[cfg(test)]
mod parser_tests {
    use loxwood as lox;

    use lox::ast::{Expr, Stmt};
    use lox::error::LoxError;
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::token::TokenType;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let tokens: Vec<_> = Scanner::new(source.as_bytes())
            .collect::<Result<_, _>>()
            .expect("test sources scan cleanly");

        let mut parser = Parser::new(tokens, 0);
        let statements = parser.parse();
        let errors = parser.take_errors();

        (statements, errors)
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        statements
    }

    #[test]
    fn test_parser_01_factor_binds_tighter_than_term() {
        let statements = parse_ok("1 + 2 * 3;");

        let Stmt::Expression(Expr::Binary { left, op, right }) = &statements[0] else {
            panic!("expected binary expression statement");
        };

        assert_eq!(op.token_type, TokenType::PLUS);
        assert!(matches!(**left, Expr::Literal(_)));

        let Expr::Binary { op: inner_op, .. } = &**right else {
            panic!("expected '*' on the right of '+'");
        };
        assert_eq!(inner_op.token_type, TokenType::STAR);
    }

    #[test]
    fn test_parser_02_assignment_is_right_associative() {
        let statements = parse_ok("a = b = 1;");

        let Stmt::Expression(Expr::Assign { name, value, .. }) = &statements[0] else {
            panic!("expected assignment");
        };

        assert_eq!(name.lexeme, "a");
        assert!(matches!(**value, Expr::Assign { .. }));
    }

    #[test]
    fn test_parser_03_invalid_assignment_target() {
        let (statements, errors) = parse("1 = 2;");

        // Reported but non-fatal: the statement still parses as its
        // left-hand side.
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Invalid assignment target."));
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_parser_04_for_desugars_to_block_and_while() {
        let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected desugared for loop to be a block");
        };

        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { condition, body } = &outer[1] else {
            panic!("expected while inside the block");
        };
        assert!(matches!(condition, Expr::Binary { .. }));

        let Stmt::Block(inner) = &**body else {
            panic!("expected loop body to be wrapped with the increment");
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_parser_05_for_without_clauses_loops_on_true() {
        let statements = parse_ok("for (;;) print 1;");

        let Stmt::While { condition, .. } = &statements[0] else {
            panic!("expected bare for loop to desugar to a while");
        };

        let Expr::Literal(token) = condition else {
            panic!("expected literal condition");
        };
        assert_eq!(token.token_type, TokenType::TRUE);
    }

    #[test]
    fn test_parser_06_synchronize_recovers_at_statement_boundary() {
        let (statements, errors) = parse("var = 1; print 2;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Expect variable name."));

        // The parser resumed after the ';' and kept the print statement.
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(_)));
    }

    #[test]
    fn test_parser_07_multiple_errors_accumulate() {
        let (_, errors) = parse("var = 1; var = 2; print 3;");

        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_parser_08_error_at_end() {
        let (_, errors) = parse("(1 + 2");

        assert_eq!(errors.len(), 1);
        let rendered = errors[0].to_string();
        assert!(rendered.contains("at end"), "got: {}", rendered);
        assert!(rendered.contains("Expect ')' after expression."));
    }

    #[test]
    fn test_parser_09_bare_super_is_an_error() {
        let (_, errors) = parse("super;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Expect '.' after 'super'."));
    }

    #[test]
    fn test_parser_10_class_declaration_shape() {
        let statements = parse_ok("class B < A { method(x) { return x; } }");

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected class declaration");
        };

        assert_eq!(name.lexeme, "B");

        let Some(Expr::Variable {
            name: super_name, ..
        }) = superclass
        else {
            panic!("expected superclass reference to be a variable node");
        };
        assert_eq!(super_name.lexeme, "A");

        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name.lexeme, "method");
        assert_eq!(methods[0].params.len(), 1);
    }

    #[test]
    fn test_parser_11_call_chain() {
        let statements = parse_ok("a.b(1).c;");

        let Stmt::Expression(Expr::Get { object, name }) = &statements[0] else {
            panic!("expected trailing property access");
        };
        assert_eq!(name.lexeme, "c");

        let Expr::Call { callee, arguments, .. } = &**object else {
            panic!("expected call under the property access");
        };
        assert_eq!(arguments.len(), 1);
        assert!(matches!(**callee, Expr::Get { .. }));
    }

    #[test]
    fn test_parser_12_each_occurrence_gets_a_distinct_id() {
        let statements = parse_ok("a; a;");

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => *id,
                other => panic!("expected variable statement, got {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_parser_13_id_counter_resumes_from_seed() {
        let tokens: Vec<_> = Scanner::new(b"x;").collect::<Result<_, _>>().unwrap();

        let mut parser = Parser::new(tokens, 41);
        let statements = parser.parse();

        let Stmt::Expression(Expr::Variable { id, .. }) = &statements[0] else {
            panic!("expected variable statement");
        };

        assert_eq!(id.0, 41);
        assert_eq!(parser.next_id(), 42);
    }

    #[test]
    fn test_parser_14_missing_semicolon() {
        let (_, errors) = parse("print 1");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Expect ';' after value."));
    }
}
