//! Unit tests for the expression transformer.

use super::*;
use crate::api::StructureOptions;
use crate::blocks;
use crate::source::SourceProgram;
use indoc::indoc;
use pretty_assertions::assert_eq;

fn rewrite(text: &str) -> String {
    transform_statement(1, text)
        .unwrap_or_else(|e| panic!("failed to transform `{}`: {}", text, e))
        .text
}

fn rewrite_err(text: &str) -> TransformError {
    transform_statement(7, text).expect_err(text)
}

fn translate(source: &str) -> String {
    let tree = blocks::build(&SourceProgram::new(source), &StructureOptions::default()).unwrap();
    transform(&tree).unwrap().to_string()
}

// ============================================================================
// Statement forms
// ============================================================================

#[test]
fn test_assignment() {
    assert_eq!(rewrite("x is 1"), "x = 1");
    assert_eq!(rewrite("total is total + price * 2"), "total = total + price * 2");
    assert_eq!(rewrite("user.name is \"Ada\""), "user.name = \"Ada\"");
    assert_eq!(rewrite("xs[0] is 5"), "xs[0] = 5");
    assert_eq!(rewrite("a, b is 1, 2"), "a, b = 1, 2");
    assert_eq!(rewrite("done is True"), "done = true");
    assert_eq!(rewrite("x = 3"), "x = 3");
}

#[test]
fn test_declarations() {
    assert_eq!(rewrite("list nums is [1, 2, 3]"), "nums = [1, 2, 3]");
    assert_eq!(rewrite("list nums"), "nums = []");
    assert_eq!(rewrite("dict user"), "user = {}");
    assert_eq!(rewrite("dict user is {name: \"Alex\", age: 30}"), "user = {\"name\": \"Alex\", \"age\": 30}");
    assert_eq!(rewrite("set seen"), "seen = set()");
    assert_eq!(rewrite("set seen is {1, 2}"), "seen = {1, 2}");
}

#[test]
fn test_say() {
    assert_eq!(rewrite("say \"hello\""), "print(\"hello\")");
    assert_eq!(rewrite("say a, b"), "print(a, b)");
    assert_eq!(rewrite("say \"Total: \" + t"), "print(\"Total: \", t)");
    assert_eq!(rewrite("say a + b"), "print(a + b)");
    assert_eq!(rewrite("say formatted \"Hi {name}\""), "print(f\"Hi {name}\")");
    assert_eq!(rewrite("say"), "print()");
    assert_eq!(rewrite("Say \"x is 5, ok\""), "print(\"x is 5, ok\")");
    assert_eq!(rewrite("say nothing"), "print(none)");
}

#[test]
fn test_ask() {
    assert_eq!(rewrite("ask name"), "name = ask()");
    assert_eq!(rewrite("ask \"Your age? \" as age"), "age = ask(\"Your age? \")");
    assert_eq!(rewrite("ask \"Ready?\""), "result = ask(\"Ready?\")");
    assert!(matches!(rewrite_err("ask"), TransformError::NotUnderstood { line: 7, .. }));
}

#[test]
fn test_flow_statements() {
    assert_eq!(rewrite("return"), "return");
    assert_eq!(rewrite("return a + b"), "return a + b");
    assert_eq!(rewrite("raise \"bad input\""), "raise \"bad input\"");
    assert_eq!(rewrite("BREAK"), "break");
    assert_eq!(rewrite("pass"), "pass");
    assert_eq!(rewrite("import math"), "import math");
    assert_eq!(rewrite("from math import sqrt, pi"), "from math import sqrt, pi");
    assert_eq!(rewrite("global count"), "global count");
}

#[test]
fn test_files() {
    assert_eq!(rewrite("open \"notes.txt\" as f"), "f = open(\"notes.txt\", \"r\")");
    assert_eq!(rewrite("open \"notes.txt\" as f for writing"), "f = open(\"notes.txt\", \"w\")");
    assert_eq!(rewrite("open path as log for appending"), "log = open(path, \"a\")");
    assert_eq!(rewrite("write f \"line\""), "write(f, \"line\")");
    assert_eq!(rewrite("append f name + \"\\n\""), "write(f, name + \"\\n\")");
    assert_eq!(rewrite("read f"), "read(f)");
    assert_eq!(rewrite("close f"), "close(f)");
    assert!(matches!(rewrite_err("write f"), TransformError::WrongArity { .. }));
}

#[test]
fn test_collections() {
    assert_eq!(rewrite("add 1 to total"), "total = add_to(total, 1)");
    assert_eq!(rewrite("add \"x\" to items"), "items = add_to(items, \"x\")");
    assert_eq!(rewrite("extend nums with [4, 5]"), "extend(nums, [4, 5])");
    assert_eq!(rewrite("insert 0 into nums at 2"), "insert(nums, 2, 0)");
    assert_eq!(rewrite("remove 3 from nums"), "remove(nums, 3)");
    assert_eq!(rewrite("sort nums"), "sort(nums)");
    assert_eq!(rewrite("get name from user"), "get(user, name)");
    assert_eq!(rewrite("get user name"), "get(user, \"name\")");
    assert_eq!(rewrite("set scores player to 10"), "scores[\"player\"] = 10");
    assert_eq!(rewrite("set scores \"Bo\" to 3"), "scores[\"Bo\"] = 3");
    assert_eq!(rewrite("set x to 5"), "x = 5");
    assert_eq!(rewrite("keys user"), "keys(user)");
    assert_eq!(rewrite("pop user \"age\""), "pop(user, \"age\")");
    assert_eq!(rewrite("pop stack"), "pop(stack)");
    assert_eq!(rewrite("unpack pair into a, b"), "a, b = pair");
    assert!(matches!(rewrite_err("add 1 to 2 + 3"), TransformError::InvalidName { .. }));
}

// ============================================================================
// Expression helpers
// ============================================================================

#[test]
fn test_text_helpers() {
    assert_eq!(rewrite("say upper of name"), "print(upper(name))");
    assert_eq!(rewrite("say lower name"), "print(lower(name))");
    assert_eq!(rewrite("x is replace s \"a\" \"b\""), "x = replace(s, \"a\", \"b\")");
    assert_eq!(rewrite("parts is split line \",\""), "parts = split(line, \",\")");
    assert_eq!(rewrite("s is join \", \" words"), "s = join(\", \", words)");
    assert_eq!(rewrite("ok is starts name \"A\""), "ok = startswith(name, \"A\")");
    assert_eq!(rewrite("say type of x"), "print(type(x))");
    assert_eq!(rewrite("say \"Hi \" + upper name"), "print(\"Hi \", upper(name))");
}

#[test]
fn test_helper_operand_ends_at_operator() {
    assert_eq!(rewrite("big is len nums > 3"), "big = len(nums) > 3");
    assert_eq!(rewrite("n is len nums + len other"), "n = len(nums) + len(other)");
    assert_eq!(rewrite("t is type of x is \"int\""), "t = type(x) == \"int\"");
    assert_eq!(rewrite("say count > 0"), "print(count > 0)");
    assert_eq!(rewrite("n is count word \"a\""), "n = count(word, \"a\")");
}

#[test]
fn test_collection_helpers() {
    assert_eq!(rewrite("big is filter is_big, nums"), "big = filter(is_big, nums)");
    assert_eq!(rewrite("doubled is map double nums"), "doubled = map(double, nums)");
    assert_eq!(rewrite("pairs is zip a, b"), "pairs = zip(a, b)");
    assert_eq!(rewrite("both is union a b"), "both = union(a, b)");
    assert_eq!(rewrite("total is sum [1, 2, 3]"), "total = sum([1, 2, 3])");
    assert_eq!(rewrite("data is json read \"d.json\""), "data = read_json(\"d.json\")");
    assert_eq!(rewrite("json write data to \"d.json\""), "write_json(data, \"d.json\")");
    assert_eq!(rewrite("rows is csv read path"), "rows = read_csv(path)");
}

#[test]
fn test_calls_and_lambdas() {
    assert_eq!(rewrite("call greet \"Ada\" 3"), "greet(\"Ada\", 3)");
    assert_eq!(rewrite("call tick"), "tick()");
    assert_eq!(rewrite("greet \"Ada Lovelace\""), "greet(\"Ada Lovelace\")");
    assert_eq!(rewrite("result is add 5 7"), "result = add(5, 7)");
    assert_eq!(rewrite("f is lambda a b -> a + b"), "f = (a, b) => a + b");
    assert_eq!(rewrite("ys is map(lambda x -> x * 2, xs)"), "ys = map((x) => x * 2, xs)");
    assert_eq!(rewrite("g is (x) => x + 1"), "g = (x) => x + 1");
}

#[test]
fn test_normalization_skips_literals() {
    assert_eq!(rewrite("say \"true is nothing\""), "print(\"true is nothing\")");
    assert_eq!(rewrite("x is number(\"3\") + decimal(s)"), "x = int(\"3\") + float(s)");
    assert_eq!(rewrite("same is a is same as b"), "same = a == b");
    assert_eq!(rewrite("diff is a is not same as b"), "diff = a != b");
    assert_eq!(rewrite("x is None"), "x = none");
    assert_eq!(rewrite("say text(5)"), "print(str(5))");
}

// ============================================================================
// Lexical gate
// ============================================================================

#[test]
fn test_lexical_gate() {
    assert_eq!(rewrite_err("say \"open"), TransformError::UnterminatedString { line: 7 });
    assert_eq!(
        rewrite_err("x is (1 + 2"),
        TransformError::UnclosedBracket { line: 7, open: '(' }
    );
    assert_eq!(
        rewrite_err("x is 1; y is 2"),
        TransformError::ForbiddenCharacter { line: 7, ch: ';' }
    );
    assert_eq!(
        rewrite_err("x is __import__(\"os\")"),
        TransformError::ReservedName {
            line: 7,
            name: "__import__".to_string()
        }
    );
    assert_eq!(rewrite("x is 1 # one"), "x = 1");
}

// ============================================================================
// Headers and whole programs
// ============================================================================

#[test]
fn test_translate_program() {
    let source = indoc! {r#"
        function area w h
          return w * h
        end
        repeat 3 as i
          if i is 0
            say "zero"
          elif i > 1
            say area i 2
          else
            pass
          end
        end
        for each k, v in items user
          say k, v
        end
        try
          raise "boom"
        catch
          say error
        finally
          say "done"
        end
        class Dog
          function init self name
            self.name is name
          end
        end
    "#};

    let expected = indoc! {r#"
        fn area(w, h)
            return w * h
        end
        for i in range(3)
            if i == 0
                print("zero")
            elif i > 1
                print(area(i, 2))
            else
                pass
            end
        end
        for k, v in items(user)
            print(k, v)
        end
        try
            raise "boom"
        catch error
            print(error)
        finally
            print("done")
        end
        class Dog
            fn init(self, name)
                self.name = name
            end
        end
    "#};

    assert_eq!(translate(source), expected);
}

#[test]
fn test_repeat_forms() {
    assert_eq!(translate("repeat 5\nsay 1\nend"), "for _ in range(5)\n    print(1)\nend\n");
    assert_eq!(translate("repeat 2 times\nend"), "for _ in range(2)\nend\n");
}

#[test]
fn test_errors_are_collected_with_lines() {
    let tree = blocks::build(
        &SourceProgram::new("say \"a\nx is 1\nif (x\nend\nask"),
        &StructureOptions::default(),
    )
    .unwrap();
    let errors = transform(&tree).unwrap_err();
    let lines: Vec<usize> = errors.iter().map(TransformError::line).collect();
    assert_eq!(lines, vec![1, 3, 5]);
}

#[test]
fn test_statements_keep_line_numbers() {
    let tree = blocks::build(
        &SourceProgram::new("x is 1\n\nif x\n  say x\nend"),
        &StructureOptions::default(),
    )
    .unwrap();
    let program = transform(&tree).unwrap();
    let lines: Vec<(usize, &str)> = program
        .statements()
        .into_iter()
        .map(|s| (s.line, s.text.as_str()))
        .collect();
    assert_eq!(lines, vec![(1, "x = 1"), (3, "if x"), (4, "print(x)")]);
}
