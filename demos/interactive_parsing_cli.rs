use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

use clap::{App, Arg};
use snips_nlu_engine::{ErrorExt, SnipsNluEngine};

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp_nanos()
        .init();

    let matches = App::new("snips-nlu-parse")
        .about("Snips NLU interactive CLI for parsing intents")
        .arg(
            Arg::with_name("NLU_ENGINE")
                .required(true)
                .takes_value(true)
                .index(1)
                .help("path to the trained nlu engine directory or zip archive"),
        )
        .arg(
            Arg::with_name("intents_alternatives")
                .short("i")
                .long("--intents-alternatives")
                .takes_value(true)
                .help("number of alternative intents to return in the output"),
        )
        .arg(
            Arg::with_name("intents_whitelist")
                .short("w")
                .long("--intents-whitelist")
                .takes_value(true)
                .multiple(true)
                .help("intents among which the parsing result is searched"),
        )
        .arg(
            Arg::with_name("intents_blacklist")
                .short("b")
                .long("--intents-blacklist")
                .takes_value(true)
                .multiple(true)
                .help("intents that the parsing result must not contain"),
        )
        .get_matches();
    let engine_path = matches.value_of("NLU_ENGINE").unwrap();
    let intents_alternatives = matches
        .value_of("intents_alternatives")
        .map(|v| v.to_string().parse::<usize>().unwrap())
        .unwrap_or(0);
    let intents_whitelist: Option<Vec<&str>> = matches
        .values_of("intents_whitelist")
        .map(|values| values.collect());
    let intents_blacklist: Option<Vec<&str>> = matches
        .values_of("intents_blacklist")
        .map(|values| values.collect());

    println!("\nLoading the nlu engine...");
    let engine = if Path::new(engine_path).is_dir() {
        SnipsNluEngine::from_path(engine_path)
    } else {
        SnipsNluEngine::from_zip(File::open(engine_path).unwrap())
    };
    let engine = match engine {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("{}", error.pretty());
            std::process::exit(1);
        }
    };
    println!(
        "Engine {} loaded (model version {})",
        SnipsNluEngine::engine_version(),
        SnipsNluEngine::model_version()
    );

    loop {
        print!("> ");
        io::stdout().flush().unwrap();
        let mut query = String::new();
        if io::stdin().read_line(&mut query).unwrap() == 0 {
            break;
        }
        match engine.parse_with_alternatives(
            query.trim(),
            intents_whitelist.clone(),
            intents_blacklist.clone(),
            intents_alternatives,
        ) {
            Ok(result) => println!("{}", serde_json::to_string_pretty(&result).unwrap()),
            Err(error) => eprintln!("{}", error.pretty()),
        }
    }
}
