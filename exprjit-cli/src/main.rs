#[macro_use]
extern crate clap;

use clap::Arg;
use std::collections::HashMap;

use exprjit::{compile, ArgSignature, DataType};

/// One declared argument binding parsed off the command line: the
/// single-letter name used in the expression source, its scalar type, and
/// the value to invoke the compiled function with.
struct BoundArg {
    name: char,
    ty: DataType,
    value: exprjit::interp::Value,
}

#[derive(Debug)]
enum Error {
    Compile(exprjit::CompileError),
    BadArgSpec(String),
    BadReturnType(String),
    MixedArgTypesUnsupported,
    TooManyArguments(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Compile(err) => write!(f, "compiling expression failed: {}", err),
            Error::BadArgSpec(s) => write!(
                f,
                "bad --arg value `{}`, expected NAME:TYPE=VALUE (TYPE is `i` or `f`)",
                s
            ),
            Error::BadReturnType(s) => write!(f, "bad --return value `{}`, expected `i` or `f`", s),
            Error::MixedArgTypesUnsupported => write!(
                f,
                "this demo CLI only invokes the JIT for all-integer or all-float argument lists; \
                 the library itself has no such restriction"
            ),
            Error::TooManyArguments(n) => {
                write!(f, "{} arguments declared, this demo CLI supports at most 4", n)
            }
        }
    }
}

impl From<exprjit::CompileError> for Error {
    fn from(e: exprjit::CompileError) -> Self {
        Error::Compile(e)
    }
}

fn parse_arg_spec(spec: &str) -> Result<BoundArg, Error> {
    let (name_ty, value) = spec
        .split_once('=')
        .ok_or_else(|| Error::BadArgSpec(spec.to_owned()))?;
    let (name, ty) = name_ty
        .split_once(':')
        .ok_or_else(|| Error::BadArgSpec(spec.to_owned()))?;
    let name = name
        .chars()
        .next()
        .filter(|_| name.chars().count() == 1)
        .ok_or_else(|| Error::BadArgSpec(spec.to_owned()))?;
    let ty = match ty {
        "i" => DataType::Integer,
        "f" => DataType::Float,
        _ => return Err(Error::BadArgSpec(spec.to_owned())),
    };
    let value = match ty {
        DataType::Integer => exprjit::interp::Value::Int(
            value
                .parse::<i64>()
                .map_err(|_| Error::BadArgSpec(spec.to_owned()))?,
        ),
        DataType::Float => exprjit::interp::Value::Float(
            value
                .parse::<f64>()
                .map_err(|_| Error::BadArgSpec(spec.to_owned()))?,
        ),
    };
    Ok(BoundArg { name, ty, value })
}

fn parse_return_type(s: &str) -> Result<DataType, Error> {
    match s {
        "i" => Ok(DataType::Integer),
        "f" => Ok(DataType::Float),
        _ => Err(Error::BadReturnType(s.to_owned())),
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("EXPR")
                .help("The expression source text to compile")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("arg")
                .long("arg")
                .short("a")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("NAME:TYPE=VALUE")
                .help("Binds a single-letter argument name, e.g. x:f=2.5"),
        )
        .arg(
            Arg::with_name("return")
                .long("return")
                .short("r")
                .takes_value(true)
                .value_name("i|f")
                .default_value("f")
                .help("The declared return type"),
        )
        .get_matches();

    let expr = matches.value_of("EXPR").unwrap();
    let return_type_str = matches.value_of("return").unwrap();

    if let Err(err) = run(expr, matches.values_of("arg"), return_type_str) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(
    expr: &str,
    arg_specs: Option<clap::Values>,
    return_type_str: &str,
) -> Result<(), Error> {
    let return_type = parse_return_type(return_type_str)?;

    let mut bound_args = Vec::new();
    for spec in arg_specs.into_iter().flatten() {
        bound_args.push(parse_arg_spec(spec)?);
    }
    if bound_args.len() > 4 {
        return Err(Error::TooManyArguments(bound_args.len()));
    }

    let mut argsmap = HashMap::new();
    let mut values = Vec::new();
    for (i, bound) in bound_args.iter().enumerate() {
        argsmap.insert(bound.name, (i as u8, bound.ty));
        values.push(bound.value);
    }

    let (arena, root) = exprjit::parser::parse(expr, &argsmap).map_err(exprjit::CompileError::from)?;
    let mut ir = exprjit::ir::generate(&arena, root, return_type);
    println!("-- IR (pre-optimization), {} instructions --", ir.len());
    for instr in &ir {
        println!("  {:?}", instr);
    }
    exprjit::ir::optimize(&mut ir);
    println!("-- IR (optimized), {} instructions --", ir.len());
    for instr in &ir {
        println!("  {:?}", instr);
    }

    let recursive = exprjit::interp::recursive::eval_typed(&arena, root, &values, return_type);
    let stack = exprjit::interp::stack::eval_typed(&arena, root, &values, return_type);
    let ir_walked = exprjit::interp::ir_walker::run(&ir, &values, return_type);
    println!("recursive interpreter : {:?}", recursive);
    println!("stack interpreter     : {:?}", stack);
    println!("IR interpreter        : {:?}", ir_walked);

    let all_int = bound_args.iter().all(|a| a.ty == DataType::Integer);
    let all_float = bound_args.iter().all(|a| a.ty == DataType::Float);

    let jit_result = if !bound_args.is_empty() && !all_int && !all_float {
        return Err(Error::MixedArgTypesUnsupported);
    } else if all_int {
        call_int_args(expr, &argsmap, return_type, &values)?
    } else {
        call_float_args(expr, &argsmap, return_type, &values)?
    };
    println!("JIT                    : {:?}", jit_result);

    Ok(())
}

fn call_int_args(
    expr: &str,
    argsmap: &HashMap<char, (u8, DataType)>,
    return_type: DataType,
    values: &[exprjit::interp::Value],
) -> Result<exprjit::interp::Value, Error> {
    use exprjit::interp::Value;

    let sig = ArgSignature {
        integer_args: values.len() as u8,
        float_args: 0,
    };
    let ints: Vec<i64> = values.iter().map(|v| v.to_i64()).collect();

    macro_rules! invoke {
        ($ret:ty, $wrap:expr, ($($p:ident : $idx:expr),*)) => {{
            let f = unsafe {
                compile::<extern "win64" fn($(exprjit_int_param!($p)),*) -> $ret>(
                    expr, argsmap, return_type, sig,
                )?
            };
            $wrap(f.get()($(ints[$idx]),*))
        }};
    }
    macro_rules! exprjit_int_param {
        ($p:ident) => {
            i64
        };
    }

    let result = match (return_type, ints.len()) {
        (DataType::Integer, 0) => invoke!(i64, Value::Int, ()),
        (DataType::Integer, 1) => invoke!(i64, Value::Int, (a: 0)),
        (DataType::Integer, 2) => invoke!(i64, Value::Int, (a: 0, b: 1)),
        (DataType::Integer, 3) => invoke!(i64, Value::Int, (a: 0, b: 1, c: 2)),
        (DataType::Integer, 4) => invoke!(i64, Value::Int, (a: 0, b: 1, c: 2, d: 3)),
        (DataType::Float, 0) => invoke!(f64, Value::Float, ()),
        (DataType::Float, 1) => invoke!(f64, Value::Float, (a: 0)),
        (DataType::Float, 2) => invoke!(f64, Value::Float, (a: 0, b: 1)),
        (DataType::Float, 3) => invoke!(f64, Value::Float, (a: 0, b: 1, c: 2)),
        (DataType::Float, 4) => invoke!(f64, Value::Float, (a: 0, b: 1, c: 2, d: 3)),
        (_, n) => return Err(Error::TooManyArguments(n)),
    };
    Ok(result)
}

fn call_float_args(
    expr: &str,
    argsmap: &HashMap<char, (u8, DataType)>,
    return_type: DataType,
    values: &[exprjit::interp::Value],
) -> Result<exprjit::interp::Value, Error> {
    use exprjit::interp::Value;

    let sig = ArgSignature {
        integer_args: 0,
        float_args: values.len() as u8,
    };
    let floats: Vec<f64> = values.iter().map(|v| v.to_f64()).collect();

    macro_rules! invoke {
        ($ret:ty, $wrap:expr, ($($idx:expr),*)) => {{
            let f = unsafe {
                compile::<extern "win64" fn($(exprjit_float_param!($idx)),*) -> $ret>(
                    expr, argsmap, return_type, sig,
                )?
            };
            $wrap(f.get()($(floats[$idx]),*))
        }};
    }
    macro_rules! exprjit_float_param {
        ($idx:expr) => {
            f64
        };
    }

    let result = match (return_type, floats.len()) {
        (DataType::Integer, 0) => invoke!(i64, Value::Int, ()),
        (DataType::Integer, 1) => invoke!(i64, Value::Int, (0)),
        (DataType::Integer, 2) => invoke!(i64, Value::Int, (0, 1)),
        (DataType::Integer, 3) => invoke!(i64, Value::Int, (0, 1, 2)),
        (DataType::Integer, 4) => invoke!(i64, Value::Int, (0, 1, 2, 3)),
        (DataType::Float, 0) => invoke!(f64, Value::Float, ()),
        (DataType::Float, 1) => invoke!(f64, Value::Float, (0)),
        (DataType::Float, 2) => invoke!(f64, Value::Float, (0, 1)),
        (DataType::Float, 3) => invoke!(f64, Value::Float, (0, 1, 2)),
        (DataType::Float, 4) => invoke!(f64, Value::Float, (0, 1, 2, 3)),
        (_, n) => return Err(Error::TooManyArguments(n)),
    };
    Ok(result)
}
