//! End-to-end code generation tests.

mod common;

use common::{Program, name, run_main};
use decaf::ast::{BinaryOp, TypeExpr};
use decaf::compiler::codegen::{ERR_ARRAY_BAD_SIZE, ERR_ARRAY_OUT_OF_BOUNDS};
use decaf::core::Span;
use decaf::{CodegenError, CompileError, Compiler, Instruction, TacListing};
use pretty_assertions::assert_eq;

fn compile(ast: &decaf::ast::Ast) -> Vec<Instruction> {
    let mut out = Vec::new();
    if let Err(err) = Compiler::new().compile(ast, &mut out) {
        panic!("compile failed: {}", err);
    }
    out
}

#[test]
fn program_without_main_emits_nothing() {
    let mut p = Program::new();
    let g = p.var("g", TypeExpr::int());
    let helper = p.function(name("helper"), TypeExpr::void(), vec![], vec![], vec![]);
    let ast = p.finish(vec![g, helper]);

    let mut out: Vec<Instruction> = Vec::new();
    let err = Compiler::new().compile(&ast, &mut out).unwrap_err();
    assert_eq!(err, CompileError::Codegen(CodegenError::NoMainFound));
    assert_eq!(err.to_string(), "linker: function 'main' not defined");
    assert!(out.is_empty());
}

/// `void main() { int n; int[] a; n = ReadInteger(); a = NewArray(n, int); print("ok"); }`
fn allocate_from_input() -> decaf::ast::Ast {
    let mut p = Program::new();
    let n = p.var("n", TypeExpr::int());
    let a = p.var("a", TypeExpr::array_of(TypeExpr::int()));
    let input = p.b.read_integer(Span::default());
    let read = p.set("n", input);
    let size = p.read("n");
    let alloc = p.b.new_array(size, TypeExpr::int(), Span::default());
    let assign = p.set("a", alloc);
    let ok = p.string("ok");
    let show = p.print(vec![ok]);
    let stmts = vec![read, assign, show];
    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![n, a], stmts);
    p.finish(vec![main])
}

#[test]
fn negative_array_size_halts() {
    let code = compile(&allocate_from_input());

    let run = run_main(&code, &[-1]);
    assert!(run.halted);
    assert_eq!(run.output, vec![ERR_ARRAY_BAD_SIZE]);

    let run = run_main(&code, &[0]);
    assert!(!run.halted);
    assert_eq!(run.output, vec!["ok"]);
}

/// `void main() { int[] a; int i; a = NewArray(3, int); i = ReadInteger();
///   a[i] = 7 * (i + 1); print(a[i]); }`
fn subscript_from_input() -> decaf::ast::Ast {
    let mut p = Program::new();
    let a = p.var("a", TypeExpr::array_of(TypeExpr::int()));
    let i = p.var("i", TypeExpr::int());

    let three = p.int(3);
    let alloc = p.b.new_array(three, TypeExpr::int(), Span::default());
    let make = p.set("a", alloc);
    let input = p.b.read_integer(Span::default());
    let read = p.set("i", input);

    let base = p.read("a");
    let index = p.read("i");
    let slot = p.b.array_access(base, index);
    let seven = p.int(7);
    let idx = p.read("i");
    let one = p.int(1);
    let next = p.binary(BinaryOp::Add, idx, one);
    let value = p.binary(BinaryOp::Mul, seven, next);
    let write = p.store(slot, value);

    let base = p.read("a");
    let index = p.read("i");
    let elem = p.b.array_access(base, index);
    let show = p.print(vec![elem]);

    let stmts = vec![make, read, write, show];
    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![a, i], stmts);
    p.finish(vec![main])
}

#[test]
fn in_range_subscripts_read_back_their_element() {
    let code = compile(&subscript_from_input());
    for (i, expected) in [(0, "7"), (1, "14"), (2, "21")] {
        let run = run_main(&code, &[i]);
        assert!(!run.halted, "index {} halted", i);
        assert_eq!(run.output, vec![expected]);
    }
}

#[test]
fn out_of_range_subscripts_halt() {
    let code = compile(&subscript_from_input());
    for i in [-1, 3, 4, i32::MIN] {
        let run = run_main(&code, &[i]);
        assert!(run.halted, "index {} did not halt", i);
        assert_eq!(run.output, vec![ERR_ARRAY_OUT_OF_BOUNDS]);
    }
}

#[test]
fn loops_and_break() {
    // int i; int sum; for (i = 0; i < 10; i = i + 1) { if (i == 4) break; sum = sum + i; }
    // print(sum, i);
    let mut p = Program::new();
    let i = p.var("i", TypeExpr::int());
    let sum = p.var("sum", TypeExpr::int());

    let zero = p.int(0);
    let init = p.read("i");
    let init = p.b.assign(init, zero);
    let lhs = p.read("i");
    let ten = p.int(10);
    let test = p.binary(BinaryOp::Lt, lhs, ten);
    let cur = p.read("i");
    let one = p.int(1);
    let inc = p.binary(BinaryOp::Add, cur, one);
    let target = p.read("i");
    let step = p.b.assign(target, inc);

    let cur = p.read("i");
    let four = p.int(4);
    let hit = p.binary(BinaryOp::Eq, cur, four);
    let brk = p.b.break_stmt(Span::default());
    let guard = p.b.if_stmt(hit, brk, None, Span::default());
    let acc = p.read("sum");
    let cur = p.read("i");
    let total = p.binary(BinaryOp::Add, acc, cur);
    let add = p.set("sum", total);
    let body = p.b.block(vec![], vec![guard, add], Span::default());
    let lp = p.b.for_stmt(Some(init), test, Some(step), body, Span::default());

    let start = p.int(0);
    let clear = p.set("sum", start);
    let s = p.read("sum");
    let n = p.read("i");
    let show = p.print(vec![s, n]);
    let stmts = vec![clear, lp, show];
    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![i, sum], stmts);
    let ast = p.finish(vec![main]);

    let run = run_main(&compile(&ast), &[]);
    assert_eq!(run.output, vec!["6", "4"]);
}

#[test]
fn relational_and_logical_operators() {
    let cases = [
        (BinaryOp::Lt, 2, 3, "true"),
        (BinaryOp::Gt, 2, 3, "false"),
        (BinaryOp::Le, 3, 3, "true"),
        (BinaryOp::Ge, 2, 3, "false"),
        (BinaryOp::Ge, 3, 3, "true"),
        (BinaryOp::Eq, 3, 3, "true"),
        (BinaryOp::Ne, 3, 3, "false"),
        (BinaryOp::Ne, 4, 3, "true"),
    ];
    for (op, l, r, expected) in cases {
        let mut p = Program::new();
        let l = p.int(l);
        let r = p.int(r);
        let cmp = p.binary(op, l, r);
        let show = p.print(vec![cmp]);
        let main = p.function(name("main"), TypeExpr::void(), vec![], vec![], vec![show]);
        let ast = p.finish(vec![main]);

        let run = run_main(&compile(&ast), &[]);
        assert_eq!(run.output, vec![expected], "{:?}", op);
    }
}

#[test]
fn not_and_negation() {
    let mut p = Program::new();
    let t = p.b.bool_const(true, Span::default());
    let not = p.b.unary(decaf::ast::UnaryOp::Not, t, Span::default());
    let five = p.int(5);
    let neg = p.b.unary(decaf::ast::UnaryOp::Neg, five, Span::default());
    let show = p.print(vec![not, neg]);
    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![], vec![show]);
    let ast = p.finish(vec![main]);

    let run = run_main(&compile(&ast), &[]);
    assert_eq!(run.output, vec!["false", "-5"]);
}

#[test]
fn string_comparison() {
    let mut p = Program::new();
    let a = p.string("abc");
    let b = p.string("abc");
    let eq = p.binary(BinaryOp::Eq, a, b);
    let a = p.string("abc");
    let b = p.string("abd");
    let ne = p.binary(BinaryOp::Ne, a, b);
    let show = p.print(vec![eq, ne]);
    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![], vec![show]);
    let ast = p.finish(vec![main]);

    let run = run_main(&compile(&ast), &[]);
    assert_eq!(run.output, vec!["true", "true"]);
}

#[test]
fn overriding_method_dispatches_by_slot() {
    // class A { int f() { return 1; } int g() { return 2; } }
    // class B extends A { int g() { return 3; } }
    // void main() { A a; a = new B; print(a.g()); }
    fn method(p: &mut Program, m: &str, v: i32) -> decaf::core::DeclId {
        let value = p.int(v);
        let ret = p.b.return_stmt(Some(value), Span::default());
        p.function(name(m), TypeExpr::int(), vec![], vec![], vec![ret])
    }

    let mut p = Program::new();
    let f = method(&mut p, "f", 1);
    let g = method(&mut p, "g", 2);
    let a = p.b.class(name("A"), None, vec![], vec![f, g]);
    let g = method(&mut p, "g", 3);
    let b = p.b.class(name("B"), Some(name("A")), vec![], vec![g]);

    let var = p.var("a", TypeExpr::named(name("A")));
    let object = p.b.new_object(name("B"), Span::default());
    let assign = p.set("a", object);
    let receiver = p.read("a");
    let call = p.b.call(Some(receiver), name("g"), vec![], Span::default());
    let show = p.print(vec![call]);
    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![var], vec![assign, show]);
    let ast = p.finish(vec![a, b, main]);

    let mut listing = TacListing::new();
    Compiler::new().compile(&ast, &mut listing).unwrap();
    let lines = listing.lines();

    assert!(lines.contains(&"VTable A = _A.f, _A.g".to_string()));
    assert!(lines.contains(&"VTable B = _A.f, _B.g".to_string()));
    let dispatch = lines
        .iter()
        .position(|l| l.ends_with("= *(a)"))
        .expect("vtable pointer load");
    assert!(lines[dispatch + 1].ends_with(" + 4)"), "{}", lines[dispatch + 1]);
    assert_eq!(lines[dispatch + 2], "PushParam a");
    assert!(lines[dispatch + 3].contains("= ACall "));
    assert_eq!(lines[dispatch + 4], "PopParams 4");
}

#[test]
fn free_function_call_passes_arguments_right_to_left() {
    // int add(int x, int y) { return x + y; }  void main() { print(add(1, 2)); }
    let mut p = Program::new();
    let x = p.var("x", TypeExpr::int());
    let y = p.var("y", TypeExpr::int());
    let lx = p.read("x");
    let ly = p.read("y");
    let sum = p.binary(BinaryOp::Add, lx, ly);
    let ret = p.b.return_stmt(Some(sum), Span::default());
    let add = p.function(name("add"), TypeExpr::int(), vec![x, y], vec![], vec![ret]);

    let one = p.int(1);
    let two = p.int(2);
    let call = p.b.call(None, name("add"), vec![one, two], Span::default());
    let show = p.print(vec![call]);
    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![], vec![show]);
    let ast = p.finish(vec![add, main]);

    let mut listing = TacListing::new();
    let output = Compiler::new().compile(&ast, &mut listing).unwrap();
    assert_eq!(output.codegen.functions, 2);
    assert_eq!(output.codegen.vtables, 0);
    assert_eq!(
        listing.lines(),
        vec![
            "add:",
            "BeginFunc",
            "_tmp0 = x + y",
            "Return _tmp0",
            "EndFunc 4",
            "main:",
            "BeginFunc",
            "_tmp1 = 1",
            "_tmp2 = 2",
            "PushParam _tmp2",
            "PushParam _tmp1",
            "_tmp3 = LCall add",
            "PopParams 8",
            "_PrintInt(_tmp3)",
            "EndFunc 12",
        ]
    );
    assert!(listing.to_string().starts_with("add:\n\tBeginFunc\n"));
}

/// Left-hand side of a `dst = ...` line.
fn dst(line: &str) -> &str {
    line.split(" = ").next().unwrap_or(line)
}

/// ```text
/// class P {
///   int x; int y;
///   void set(int a, int b) { x = a; this.y = b; }
///   int diff() { return x - y; }
///   void bump() { set(x + 1, y); }
/// }
/// void main() {
///   P p; int[] arr;
///   p = new P; p.x = 5; p.y = 2; print(p.x - p.y);
///   p.set(11, 22); print(p.x, p.y);
///   p.bump(); print(p.diff());
///   arr = NewArray(4, int); print(arr.length());
///   p = null; print("done");
/// }
/// ```
fn point_program() -> decaf::ast::Ast {
    let mut p = Program::new();
    let field = |p: &mut Program, object: &str, member: &str| {
        let base = p.read(object);
        p.b.field_access(Some(base), name(member))
    };

    let x = p.var("x", TypeExpr::int());
    let y = p.var("y", TypeExpr::int());

    let a = p.var("a", TypeExpr::int());
    let b = p.var("b", TypeExpr::int());
    let value = p.read("a");
    let set_x = p.set("x", value);
    let this = p.b.this(Span::default());
    let this_y = p.b.field_access(Some(this), name("y"));
    let value = p.read("b");
    let set_y = p.store(this_y, value);
    let set = p.function(name("set"), TypeExpr::void(), vec![a, b], vec![], vec![set_x, set_y]);

    let lx = p.read("x");
    let ly = p.read("y");
    let delta = p.binary(BinaryOp::Sub, lx, ly);
    let ret = p.b.return_stmt(Some(delta), Span::default());
    let diff = p.function(name("diff"), TypeExpr::int(), vec![], vec![], vec![ret]);

    let lx = p.read("x");
    let one = p.int(1);
    let next = p.binary(BinaryOp::Add, lx, one);
    let ly = p.read("y");
    let call = p.b.call(None, name("set"), vec![next, ly], Span::default());
    let again = p.b.expr_stmt(call);
    let bump = p.function(name("bump"), TypeExpr::void(), vec![], vec![], vec![again]);

    let class = p.b.class(name("P"), None, vec![], vec![x, y, set, diff, bump]);

    let var_p = p.var("p", TypeExpr::named(name("P")));
    let var_arr = p.var("arr", TypeExpr::array_of(TypeExpr::int()));
    let mut stmts = Vec::new();

    let object = p.b.new_object(name("P"), Span::default());
    stmts.push(p.set("p", object));
    for (member, v) in [("x", 5), ("y", 2)] {
        let target = field(&mut p, "p", member);
        let value = p.int(v);
        stmts.push(p.store(target, value));
    }
    let px = field(&mut p, "p", "x");
    let py = field(&mut p, "p", "y");
    let delta = p.binary(BinaryOp::Sub, px, py);
    stmts.push(p.print(vec![delta]));

    let receiver = p.read("p");
    let eleven = p.int(11);
    let twenty_two = p.int(22);
    let call = p.b.call(Some(receiver), name("set"), vec![eleven, twenty_two], Span::default());
    stmts.push(p.b.expr_stmt(call));
    let px = field(&mut p, "p", "x");
    let py = field(&mut p, "p", "y");
    stmts.push(p.print(vec![px, py]));

    let receiver = p.read("p");
    let call = p.b.call(Some(receiver), name("bump"), vec![], Span::default());
    stmts.push(p.b.expr_stmt(call));
    let receiver = p.read("p");
    let call = p.b.call(Some(receiver), name("diff"), vec![], Span::default());
    stmts.push(p.print(vec![call]));

    let four = p.int(4);
    let alloc = p.b.new_array(four, TypeExpr::int(), Span::default());
    stmts.push(p.set("arr", alloc));
    let array = p.read("arr");
    let length = p.b.call(Some(array), name("length"), vec![], Span::default());
    stmts.push(p.print(vec![length]));

    let null = p.b.null(Span::default());
    stmts.push(p.set("p", null));
    let done = p.string("done");
    stmts.push(p.print(vec![done]));

    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![var_p, var_arr], stmts);
    p.finish(vec![class, main])
}

fn point_listing() -> Vec<String> {
    let mut listing = TacListing::new();
    if let Err(err) = Compiler::new().compile(&point_program(), &mut listing) {
        panic!("compile failed: {}", err);
    }
    listing.lines()
}

/// Lines of the function labelled `label`, label through `EndFunc`.
fn function_body<'l>(lines: &'l [String], label: &str) -> &'l [String] {
    let start = lines
        .iter()
        .position(|l| *l == format!("{}:", label))
        .unwrap_or_else(|| panic!("no function {}", label));
    let len = lines[start..]
        .iter()
        .position(|l| l.starts_with("EndFunc"))
        .expect("unterminated function");
    &lines[start..=start + len]
}

#[test]
fn objects_fields_and_methods_run() {
    let code = compile(&point_program());
    let run = run_main(&code, &[]);
    assert!(!run.halted);
    assert_eq!(run.output, vec!["3", "11", "22", "-10", "4", "done"]);
}

#[test]
fn field_stores_address_through_receiver() {
    let lines = point_listing();
    let set = function_body(&lines, "_P.set");
    assert!(set.contains(&"*(this + 4) = a".to_string()), "{:#?}", set);
    assert!(set.contains(&"*(this + 8) = b".to_string()), "{:#?}", set);

    let main = function_body(&lines, "main");
    let five = main.iter().position(|l| l.ends_with(" = 5")).expect("constant 5");
    assert_eq!(main[five + 1], format!("*(p + 4) = {}", dst(&main[five])));
    let two = main.iter().position(|l| l.ends_with(" = 2")).expect("constant 2");
    assert_eq!(main[two + 1], format!("*(p + 8) = {}", dst(&main[two])));
    assert!(main.iter().any(|l| l.ends_with(" = *(p + 4)")));
    assert!(main.iter().any(|l| l.ends_with(" = *(p + 8)")));
}

#[test]
fn new_object_allocates_header_and_fields() {
    let lines = point_listing();
    let main = function_body(&lines, "main");
    let size = main.iter().position(|l| l.ends_with(" = 12")).expect("instance size");
    let object = dst(&main[size + 1]);
    assert_eq!(main[size + 1], format!("{} = _Alloc({})", object, dst(&main[size])));
    let vtable = dst(&main[size + 2]);
    assert_eq!(main[size + 2], format!("{} = P", vtable));
    assert_eq!(main[size + 3], format!("*({}) = {}", object, vtable));
    assert_eq!(main[size + 4], format!("p = {}", object));
}

#[test]
fn method_call_pushes_arguments_then_receiver() {
    let lines = point_listing();
    let main = function_body(&lines, "main");
    let receiver = main.iter().position(|l| l == "PushParam p").expect("receiver push");

    assert!(main[receiver - 6].ends_with(" = 11"));
    assert!(main[receiver - 5].ends_with(" = 22"));
    let vtable = dst(&main[receiver - 4]);
    assert_eq!(main[receiver - 4], format!("{} = *(p)", vtable));
    let method = dst(&main[receiver - 3]);
    assert_eq!(main[receiver - 3], format!("{} = *({})", method, vtable));
    assert_eq!(main[receiver - 2], format!("PushParam {}", dst(&main[receiver - 5])));
    assert_eq!(main[receiver - 1], format!("PushParam {}", dst(&main[receiver - 6])));
    assert_eq!(main[receiver + 1], format!("ACall {}", method));
    assert_eq!(main[receiver + 2], "PopParams 12");
}

#[test]
fn unqualified_method_call_uses_this() {
    let lines = point_listing();
    let bump = function_body(&lines, "_P.bump");
    let receiver = bump.iter().position(|l| l == "PushParam this").expect("receiver push");
    assert!(bump[..receiver].iter().any(|l| l.ends_with(" = *(this)")));
    assert!(bump[receiver + 1].starts_with("ACall "));
    assert_eq!(bump[receiver + 2], "PopParams 12");
}

#[test]
fn array_length_loads_header_word() {
    let lines = point_listing();
    let main = function_body(&lines, "main");
    let length = main.iter().position(|l| l.ends_with(" = *(arr)")).expect("length load");
    assert_eq!(main[length + 1], format!("_PrintInt({})", dst(&main[length])));
}

#[test]
fn null_allocates_one_word() {
    let lines = point_listing();
    let main = function_body(&lines, "main");
    let store = main.iter().rposition(|l| l.starts_with("p = ")).expect("null store");
    let null = dst(&main[store - 1]);
    assert_eq!(main[store], format!("p = {}", null));
    assert_eq!(main[store - 1], format!("{} = _Alloc({})", null, dst(&main[store - 2])));
    assert!(main[store - 2].ends_with(" = 4"));
}

#[test]
fn read_line_yields_a_string() {
    // void main() { string s; s = ReadLine(); print(s); }
    let mut p = Program::new();
    let s = p.var("s", TypeExpr::string());
    let line = p.b.read_line(Span::default());
    let read = p.set("s", line);
    let value = p.read("s");
    let show = p.print(vec![value]);
    let main = p.function(name("main"), TypeExpr::void(), vec![], vec![s], vec![read, show]);
    let ast = p.finish(vec![main]);

    let mut listing = TacListing::new();
    Compiler::new().compile(&ast, &mut listing).unwrap();
    assert_eq!(
        listing.lines(),
        vec![
            "main:",
            "BeginFunc",
            "_tmp0 = _ReadLine()",
            "s = _tmp0",
            "_PrintString(s)",
            "EndFunc 8",
        ]
    );
}
