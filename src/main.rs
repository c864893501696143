use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process,
};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use log::info;

use nfa2dfa::{
    is_end_of_transitions, parse_nfa, parse_state, parse_state_list, parse_symbol_list,
    parse_transition, warn_undeclared, Dfa, Error, InputError, Nfa,
};

fn cli() -> Command {
    Command::new("nfa2dfa")
        .about("Convert an NFA (epsilon moves allowed) into a DFA by subset construction")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Read the NFA from a file instead of prompting for it"),
        )
        .arg(
            Arg::new("dot")
                .short('d')
                .long("dot")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Also write the DFA as a Graphviz dot file"),
        )
        .arg(
            Arg::new("max-states")
                .long("max-states")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Give up once the DFA grows past N states"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .action(ArgAction::SetTrue)
                .help("Disable colored output"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log the exploration of DFA states (RUST_LOG takes precedence)"),
        )
}

fn main() {
    let matches = cli().get_matches();

    let default_level = match matches.get_flag("verbose") {
        true => "debug",
        false => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }

    if let Err(error) = run(&matches) {
        eprintln!("{} {}", "error:".red().bold(), error);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> nfa2dfa::Result<()> {
    let nfa = match matches.get_one::<PathBuf>("input") {
        Some(path) => read_nfa(path)?,
        None => prompt_nfa(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let dfa = match matches.get_one::<usize>("max-states") {
        Some(&limit) => Dfa::from_nfa_bounded(&nfa, limit)?,
        None => Dfa::from_nfa(&nfa),
    };
    info!("DFA has {} states", dfa.state_count());

    println!("\nTransition Table (DFA):");
    print!("{}", dfa.table().render_colored());

    if let Some(path) = matches.get_one::<PathBuf>("dot") {
        dfa.dump(path)?;
        println!("\nDFA graph written to {}", path.display());
    }

    Ok(())
}

fn read_nfa(path: &Path) -> nfa2dfa::Result<Nfa> {
    let source = fs::read_to_string(path)?;

    parse_nfa(&source).map_err(|error| {
        if let Error::Input { line, source: cause } = &error {
            if let Some(text) = source.lines().nth(line - 1) {
                eprintln!("{:>4} | {}", line, cause.highlight(text));
            }
        }
        error
    })
}

fn report(error: &InputError, text: &str) {
    eprintln!("{} {}", "invalid input:".red().bold(), error);
    eprintln!("  {}", error.highlight(text));
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> io::Result<String> {
    write!(output, "{}", message)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }

    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Asks again until `parse` accepts the answer.
fn prompt_until<R, W, T, F>(input: &mut R, output: &mut W, message: &str, parse: F) -> io::Result<T>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> Result<T, InputError>,
{
    loop {
        let text = prompt(input, output, message)?;
        match parse(&text) {
            Ok(value) => return Ok(value),
            Err(error) => report(&error, &text),
        }
    }
}

fn prompt_nfa<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Nfa> {
    let states = parse_state_list(&prompt(input, output, "Enter states of NFA separated by comma: ")?);
    let alphabet = prompt_until(
        input,
        output,
        "Enter alphabet of NFA separated by comma: ",
        parse_symbol_list,
    )?;
    let start_state = prompt_until(input, output, "Enter start state of NFA: ", parse_state)?;
    let accept_states = parse_state_list(&prompt(
        input,
        output,
        "Enter accept states of NFA separated by comma: ",
    )?);

    let mut nfa = Nfa::new(states, alphabet, start_state, accept_states);

    loop {
        let text = prompt(
            input,
            output,
            "Enter transition (state, symbol, next_states) separated by comma (enter 'done' to finish): ",
        )?;
        if is_end_of_transitions(&text) {
            break;
        }

        match parse_transition(&text, nfa.alphabet()) {
            Ok((state, on, next_states)) => {
                nfa.add_transition(state, on, next_states);
            }
            Err(error) => report(&error, &text),
        }
    }

    warn_undeclared(&nfa);

    Ok(nfa)
}
