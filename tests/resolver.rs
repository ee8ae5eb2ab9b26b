#[cfg(test)]
mod resolver_tests {
    use loxwood as lox;

    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn resolve_errors(source: &str) -> Vec<LoxError> {
        let mut interpreter = Interpreter::with_output(Box::new(SharedBuffer::default()));
        interpreter.run(source)
    }

    fn assert_resolve_error(source: &str, message: &str) {
        let errors = resolve_errors(source);

        assert!(
            errors
                .iter()
                .any(|e| matches!(e, LoxError::Resolve { .. }) && e.to_string().contains(message)),
            "expected resolve error containing {:?}, got: {:?}",
            message,
            errors
        );

        assert!(
            errors.iter().all(|e| !e.is_fatal()),
            "resolve errors must map to the compile-time exit code"
        );
    }

    #[test]
    fn test_resolver_01_top_level_return() {
        assert_resolve_error("return 1;", "Can't return from top-level code.");
    }

    #[test]
    fn test_resolver_02_this_outside_class() {
        assert_resolve_error("print this;", "Can't use 'this' outside of a class.");
        assert_resolve_error(
            "fun f() { return this; }",
            "Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_resolver_03_super_outside_class() {
        assert_resolve_error(
            "fun f() { super.g(); }",
            "Can't use 'super' outside of a class.",
        );
    }

    #[test]
    fn test_resolver_04_super_without_superclass() {
        assert_resolve_error(
            "class A { method() { super.method(); } }",
            "Can't use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn test_resolver_05_class_inheriting_from_itself() {
        assert_resolve_error("class A < A {}", "A class can't inherit from itself.");
    }

    #[test]
    fn test_resolver_06_duplicate_local() {
        assert_resolve_error(
            "{ var a = 1; var a = 2; }",
            "Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_resolver_07_self_referential_initializer() {
        assert_resolve_error(
            "{ var a = a; }",
            "Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_resolver_08_valued_return_from_initializer() {
        assert_resolve_error(
            "class C { init() { return 1; } }",
            "Can't return a value from an initializer.",
        );
    }

    #[test]
    fn test_resolver_09_bare_return_from_initializer_is_legal() {
        let errors = resolve_errors("class C { init() { return; } }");
        assert!(errors.is_empty(), "got: {:?}", errors);
    }

    #[test]
    fn test_resolver_10_errors_accumulate() {
        let errors = resolve_errors("{ var a = a; var b; var b; }");

        let resolve_count = errors
            .iter()
            .filter(|e| matches!(e, LoxError::Resolve { .. }))
            .count();

        assert_eq!(resolve_count, 2, "got: {:?}", errors);
    }

    #[test]
    fn test_resolver_11_global_redeclaration_is_allowed() {
        let errors = resolve_errors("var a = 1; var a = 2;");
        assert!(errors.is_empty(), "got: {:?}", errors);
    }

    #[test]
    fn test_resolver_12_shadowing_in_nested_scope_is_allowed() {
        let errors = resolve_errors("{ var a = 1; { var a = 2; } }");
        assert!(errors.is_empty(), "got: {:?}", errors);
    }

    #[test]
    fn test_resolver_13_duplicate_parameter() {
        assert_resolve_error(
            "fun f(a, a) {}",
            "Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_resolver_14_errors_do_not_poison_the_session() {
        let mut interpreter = Interpreter::with_output(Box::new(SharedBuffer::default()));

        let errors = interpreter.run("return 1;");
        assert!(!errors.is_empty());

        // The same interpreter keeps working on the next input.
        let errors = interpreter.run("var ok = 1;");
        assert!(errors.is_empty(), "got: {:?}", errors);
    }
}
