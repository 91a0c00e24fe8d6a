use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use clap_stdin::FileOrStdin;

use mcc::lexer::{Lexer, Token, TokenKind};
use mcc::{CompileError, Interner, SourceFile};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    Tokens,
    Ast,
    Ir,
}

#[derive(Parser, Debug)]
#[command(version, about = "Compiles an mc program to block-structured IR")]
struct Cli {
    /// Source file, or `-` to read standard input
    input: FileOrStdin,

    /// What to print on success
    #[arg(long, value_enum, default_value_t = Emit::Ir)]
    emit: Emit,

    /// Report each phase on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> mcc::Result<()> {
    let name = if cli.input.is_stdin() {
        "<stdin>".to_string()
    } else {
        cli.input.filename().to_string()
    };
    let text = cli.input.contents().map_err(|e| CompileError::Io {
        path: name.clone(),
        message: e.to_string(),
    })?;
    let source = SourceFile::new(name, text);
    let interner = Interner::new();

    if cli.emit == Emit::Tokens {
        let tokens = Lexer::new(&source, &interner).tokenize()?;
        for t in &tokens {
            println!("{}", describe(t, &interner));
        }
        return Ok(());
    }

    if cli.verbose {
        eprintln!("parsing {}", source.name());
    }
    let unit = mcc::parse(&source, &interner)?;
    if cli.verbose {
        eprintln!(
            "analyzed {} declarations, {} expressions",
            unit.decls().len(),
            unit.ast.exprs.len()
        );
    }
    if cli.emit == Emit::Ast {
        println!("{:#?}", unit);
        return Ok(());
    }

    let module = mcc::lower(&unit, &interner)?;
    if cli.verbose {
        eprintln!(
            "lowered {} globals, {} functions",
            module.globals.len(),
            module.functions.len()
        );
    }
    print!("{}", module);
    Ok(())
}

fn describe(token: &Token, interner: &Interner) -> String {
    match token.kind {
        TokenKind::Ident(sym) => format!("{}: identifier `{}`", token.loc, interner.resolve(sym)),
        TokenKind::Str(sym) => format!("{}: string {:?}", token.loc, interner.resolve(sym)),
        ref kind => format!("{}: {}", token.loc, kind),
    }
}
