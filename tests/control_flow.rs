#[macro_use]
mod cases;

use indoc::indoc;
use tale::FailureKind;

test_case!(
    if_else_chain,
    input: indoc! {r#"
        ask score
        if score >= 90
          say "A"
        elif score >= 80
          say "B"
        else
          say "C"
        end
    "#},
    inputs: ["85"],
    output: Ok("B\n"),
);

test_case!(
    is_compares_in_conditions,
    input: indoc! {r#"
        x is 3
        if x is 3 and x is not 4
          say "three"
        end
    "#},
    output: Ok("three\n"),
);

test_case!(
    countdown,
    input: indoc! {r#"
        n is 3
        while n > 0
          say n
          n is n - 1
        end
        say "liftoff"
    "#},
    output: Ok("3\n2\n1\nliftoff\n"),
);

test_case!(
    repeat_counts_from_zero,
    input: indoc! {"
        total is 0
        repeat 5 times as i
          add i to total
        end
        say total
    "},
    output: Ok("10\n"),
);

test_case!(
    for_each_over_text,
    input: indoc! {r#"
        for each letter in "abc"
          say upper of letter
        end
    "#},
    output: Ok("A\nB\nC\n"),
);

test_case!(
    nested_loops_with_break,
    input: indoc! {"
        for each i in range(1, 4)
          for each j in range(1, 4)
            if j > i
              break
            end
            say i * j
          end
        end
    "},
    output: Ok("1\n2\n4\n3\n6\n9\n"),
);

test_case!(
    comments_and_blank_lines_are_skipped,
    input: indoc! {r#"
        # greeting
        say "hi"

        note """
        A note that spans
        several lines.
        """
        say "bye"  # trailing
    "#},
    output: Ok("hi\nbye\n"),
);

test_case!(
    orphan_else,
    input: "say 1\nelse\nsay 2",
    output: Err((FailureKind::Structural, "")),
);

test_case!(
    break_outside_loop,
    input: "break",
    output: Err((FailureKind::Validation, "")),
);

test_case!(
    return_outside_function,
    input: "return 1",
    output: Err((FailureKind::Validation, "")),
);

test_case!(
    unreadable_line,
    input: "say 1\nplease do the thing with care\nsay 2",
    output: Err((FailureKind::Validation, "")),
);

test_case!(
    unclosed_bracket,
    input: "xs is [1, 2",
    output: Err((FailureKind::Transform, "")),
);
