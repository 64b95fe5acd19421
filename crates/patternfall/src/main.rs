//! Generate, inspect and play daily hidden-rule word puzzles
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![warn(
    bad_style,
    dead_code,
    improper_ctypes,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    no_mangle_generic_items,
    non_shorthand_field_patterns,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_crate_dependencies,
    unused_extern_crates,
    unused_import_braces,
    unused_parens,
    unused_qualifications,
    unused_results,
    unused,
    while_true
)]

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use eyre::{Result, WrapErr};
use patternfall_engine::{
    engine::DEFAULT_DATA_DIR,
    prepare::{load_word_list, DEFAULT_WORD_LIST},
    CorpusFrequency, Engine, EngineConfig, FrequencyOracle, PuzzlePayload, RankParams,
};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

fn main() -> Result<()> {
    let opts = parse_opts();
    init_logging(opts.verbosity);
    log::debug!("using data directory {}", opts.config.data_dir.display());

    let engine = Engine::open(opts.config);
    match opts.cmd {
        Cmd::Build {
            word_list,
            frequencies,
        } => build(&engine, &word_list, frequencies.as_deref()),
        Cmd::Daily => daily(&engine),
        Cmd::Random { seed } => random(&engine, seed),
        Cmd::Today => today(&engine),
        Cmd::Candidates { limit } => candidates(&engine, limit),
        Cmd::Play { practice } => play(&engine, practice),
    }
}

#[derive(Debug)]
struct Opts {
    config: EngineConfig,
    verbosity: i8,
    cmd: Cmd,
}

#[derive(Debug)]
enum Cmd {
    Build {
        word_list: PathBuf,
        frequencies: Option<PathBuf>,
    },
    Daily,
    Random {
        seed: Option<u64>,
    },
    Today,
    Candidates {
        limit: usize,
    },
    Play {
        practice: bool,
    },
}

#[derive(Clone, Copy, Debug)]
struct MinPqs(f64);

impl FromStr for MinPqs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<f64>().map_err(|e| e.to_string()).and_then(|f| {
            if f.is_finite() && f >= 0.0 {
                Ok(Self(f))
            } else {
                Err(String::from("The value must be a non-negative number"))
            }
        })
    }
}

fn parse_opts() -> Opts {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data-dir")
                .value_name("DIR")
                .help("Where the feature table, the history, and today's puzzle are kept")
                .short('d')
                .long("data-dir")
                .env("PATTERNFALL_DATA_DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_DATA_DIR)
                .global(true),
        )
        .arg(
            Arg::new("min-pqs")
                .value_name("SCORE")
                .help("Minimum quality score of a puzzle")
                .long_help(concat!(
                    "Minimum Pattern Quality Score of a puzzle. ",
                    "Scores range from about 0 to 4, candidates below this score are never shown. ",
                    "Raising it gives fewer but clearer puzzles.",
                ))
                .long("min-pqs")
                .env("PATTERNFALL_MIN_PQS")
                .value_parser(str::parse::<MinPqs>)
                .default_value("0.7")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .help("Log more details, can be given twice")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .help("Only log warnings and errors")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .global(true),
        )
        .subcommand(
            Command::new("build")
                .about("Build the feature table from a word list")
                .arg(
                    Arg::new("word-list")
                        .value_name("WORD_LIST")
                        .help("The word list to use")
                        .long_help(concat!(
                            "The word list to use. ",
                            "The list must contain one word per line. ",
                            "Words are lowercased, words that are not 3 to 20 letters ",
                            "are ignored, as are duplicates. ",
                            "The list does not have to be sorted."
                        ))
                        .env("WORD_LIST")
                        .value_parser(value_parser!(PathBuf))
                        .default_value(DEFAULT_WORD_LIST),
                )
                .arg(
                    Arg::new("frequencies")
                        .value_name("COUNTS")
                        .help("Word counts to rate how common a word is")
                        .long_help(concat!(
                            "A file with word counts, one `word<TAB>count` per line, ",
                            "like the `count_1w.txt` file of Peter Norvig. ",
                            "Without it, how common a word is will be estimated from its spelling."
                        ))
                        .short('f')
                        .long("frequencies")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("daily")
                .about("Generate today's puzzle and show it with its answer")
                .long_about(concat!(
                    "Generate today's puzzle and show it with its answer. ",
                    "If a puzzle has already been generated today, that puzzle is shown."
                )),
        )
        .subcommand(
            Command::new("random")
                .about("Draw a practice puzzle, recently used rules included")
                .arg(
                    Arg::new("seed")
                        .value_name("SEED")
                        .help("Seed to draw the same puzzle again")
                        .short('s')
                        .long("seed")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("today").about("Show today's puzzle, if it has already been generated"),
        )
        .subcommand(
            Command::new("candidates")
                .about("List the candidates that pass the quality filter, best first")
                .arg(
                    Arg::new("limit")
                        .value_name("N")
                        .help("Show at most this many candidates")
                        .short('n')
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .default_value("20"),
                ),
        )
        .subcommand(
            Command::new("play")
                .about("Play today's puzzle in the terminal")
                .arg(
                    Arg::new("practice")
                        .help("Play a random practice puzzle instead")
                        .short('p')
                        .long("practice")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let (name, sub) = matches.subcommand().expect("subcommand is required");

    let data_dir = sub.get_one::<PathBuf>("data-dir").unwrap().clone();
    let min_pqs = sub.get_one::<MinPqs>("min-pqs").unwrap().0;
    let verbosity = if sub.get_flag("quiet") {
        -1
    } else {
        i8::try_from(sub.get_count("verbose")).unwrap_or(i8::MAX)
    };

    let config = EngineConfig {
        data_dir,
        rank: RankParams {
            min_pqs,
            ..RankParams::default()
        },
        ..EngineConfig::default()
    };

    Opts {
        config,
        verbosity,
        cmd: parse_cmd(name, sub),
    }
}

fn parse_cmd(name: &str, sub: &ArgMatches) -> Cmd {
    match name {
        "build" => Cmd::Build {
            word_list: sub.get_one::<PathBuf>("word-list").unwrap().clone(),
            frequencies: sub.get_one::<PathBuf>("frequencies").cloned(),
        },
        "daily" => Cmd::Daily,
        "random" => Cmd::Random {
            seed: sub.get_one::<u64>("seed").copied(),
        },
        "today" => Cmd::Today,
        "candidates" => Cmd::Candidates {
            limit: *sub.get_one::<usize>("limit").unwrap(),
        },
        "play" => Cmd::Play {
            practice: sub.get_flag("practice"),
        },
        _ => unreachable!("all subcommands are handled"),
    }
}

fn init_logging(verbosity: i8) {
    let level = match verbosity {
        i8::MIN..=-1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn build(engine: &Engine, word_list: &Path, frequencies: Option<&Path>) -> Result<()> {
    let words = load_word_list(word_list)
        .wrap_err_with(|| format!("The file '{}' is missing.", word_list.display()))?;
    eyre::ensure!(
        !words.is_empty(),
        "The word list '{}' does not contain any usable word.",
        word_list.display()
    );

    let oracle = frequencies
        .map(|file| {
            CorpusFrequency::load(file).wrap_err_with(|| {
                format!("The word counts in '{}' could not be read.", file.display())
            })
        })
        .transpose()?;
    if let Some(oracle) = &oracle {
        log::info!("loaded {} word counts", oracle.len());
    }

    let table = engine
        .rebuild_table(words.as_slice(), oracle.as_ref().map(|o| o as &dyn FrequencyOracle))
        .wrap_err("The feature table could not be built.")?;

    println!(
        "Built a feature table for {} words in '{}'",
        table.len(),
        engine.store().feature_table_path().display()
    );
    Ok(())
}

fn daily(engine: &Engine) -> Result<()> {
    match engine.generate_daily()? {
        Some(puzzle) => {
            print_puzzle(&puzzle);
            print_hints(&puzzle.hints);
            print_answer(&puzzle);
        }
        None => println!("No puzzle today, every candidate has been used recently."),
    }
    Ok(())
}

fn random(engine: &Engine, seed: Option<u64>) -> Result<()> {
    let puzzle = match seed {
        Some(seed) => engine.generate_random_puzzle_with(&mut StdRng::seed_from_u64(seed))?,
        None => engine.generate_random_puzzle()?,
    };
    match puzzle {
        Some(puzzle) => {
            print_puzzle(&puzzle);
            print_hints(&puzzle.hints);
            print_answer(&puzzle);
        }
        None => println!("No candidate passes the quality filter."),
    }
    Ok(())
}

fn today(engine: &Engine) -> Result<()> {
    match engine.load_today() {
        Some(puzzle) => {
            print_puzzle(&puzzle);
            print_hints(&puzzle.hints);
        }
        None => println!("There is no puzzle for today yet, run `patternfall daily` to create it."),
    }
    Ok(())
}

fn candidates(engine: &Engine, limit: usize) -> Result<()> {
    let ranked = engine.ranked_candidates()?;
    eprintln!("Found {} candidates", ranked.len());

    for ranked in ranked.iter().take(limit) {
        let puzzle = PuzzlePayload::new(ranked, None);
        println!(
            "{:>5.2}  {:<6}  {:<20}  {}",
            ranked.pqs,
            puzzle.difficulty.as_str(),
            puzzle.template_id.as_str(),
            puzzle.rule
        );
        println!("       {}", puzzle.words.join(", "));
    }
    Ok(())
}

fn play(engine: &Engine, practice: bool) -> Result<()> {
    const QUIT: &str = "-- QUIT I don't want to play anymore";

    let puzzle = if practice {
        engine.generate_random_puzzle()?
    } else {
        engine.generate_daily()?
    };
    let puzzle = match puzzle {
        Some(puzzle) => puzzle,
        None => {
            println!("There is no puzzle to play right now.");
            return Ok(());
        }
    };

    print_puzzle(&puzzle);
    eprintln!("What do these words have in common?");

    let mut shown = 0;
    loop {
        let has_hint = shown < puzzle.hints.len();

        let mut selection = dialoguer::Select::new();
        if has_hint {
            let _ = selection.item(format!("Show hint {} of {}", shown + 1, puzzle.hints.len()));
        }
        let selection = selection
            .with_prompt("Do you want some help?")
            .default(0)
            .item("-- I have an idea, show me the rule")
            .item(QUIT)
            .interact()?;

        match selection.checked_sub(usize::from(has_hint)) {
            None => {
                println!("Hint {}: {}", shown + 1, puzzle.hints[shown]);
                shown += 1;
            }
            Some(0) => {
                print_answer(&puzzle);
                return Ok(());
            }
            Some(_) => return Ok(()),
        }
    }
}

fn print_puzzle(puzzle: &PuzzlePayload) {
    match puzzle.date {
        Some(date) => println!("Puzzle for {date} ({})", puzzle.difficulty),
        None => println!("Practice puzzle ({})", puzzle.difficulty),
    }
    let words = puzzle
        .words
        .iter()
        .map(|w| w.to_ascii_uppercase())
        .collect::<Vec<_>>();
    println!("  {}", words.join("  "));
}

fn print_hints(hints: &[String]) {
    for (i, hint) in hints.iter().enumerate() {
        println!("Hint {}: {hint}", i + 1);
    }
}

fn print_answer(puzzle: &PuzzlePayload) {
    println!("Rule: {}", puzzle.rule);
    println!(
        "      {} on {}, score {:.2}",
        puzzle.template_id, puzzle.metric, puzzle.pqs
    );
}
