use anyhow::Context;
use charembed::vocab::EOS_SYMBOL;
use charembed::{
    CharCode, CharacterCodec, CharacterTokenEmbedder, Dictionary, EmbedderConfig, EmbedderInput,
    InputMode, Vocabulary, CHAR_EOS,
};
use ndarray::{Array2, Array3};
use std::env;
use tracing_subscriber::EnvFilter;

/// Components printed per word
const PREVIEW: usize = 4;

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS] <word>...", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <PATH>       JSON embedder configuration");
    eprintln!("                        (default: 4 filters, 64-dim words, 2 highway layers)");
    eprintln!("  --max-char-len <N>    Characters kept per word (overrides the config)");
    eprintln!("  --dict <PATH>         Dictionary file, one \"<word> <count>\" per line");
    eprintln!("                        (default: built from the words given)");
    eprintln!("  --chars               Feed raw character codes instead of token ids");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} cat cats dog", program);
    eprintln!("  {} --dict dict.txt --max-char-len 20 \"</s>\" unseen", program);
    eprintln!("  {} --chars --config embedder.json cat", program);
}

fn default_config() -> EmbedderConfig {
    EmbedderConfig::new(&[(1, 32), (2, 32), (3, 64), (4, 128)], 16, 64, 2)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let program = &args[0];

    let mut config_path: Option<String> = None;
    let mut dict_path: Option<String> = None;
    let mut max_char_len: Option<usize> = None;
    let mut raw_chars = false;
    let mut words: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage(program);
                return Ok(());
            }
            "--chars" => {
                raw_chars = true;
                i += 1;
            }
            "--config" | "--dict" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: {} requires a value", args[i]);
                    std::process::exit(1);
                }
                if args[i] == "--config" {
                    config_path = Some(args[i + 1].clone());
                } else {
                    dict_path = Some(args[i + 1].clone());
                }
                i += 2;
            }
            "--max-char-len" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --max-char-len requires a value");
                    std::process::exit(1);
                }
                max_char_len = Some(args[i + 1].parse().unwrap_or_else(|_| {
                    eprintln!("Error: invalid --max-char-len value '{}'", args[i + 1]);
                    std::process::exit(1);
                }));
                i += 2;
            }
            arg if arg.starts_with("--") => {
                eprintln!("Error: unknown option '{}'", arg);
                eprintln!("Use --help for usage information.");
                std::process::exit(1);
            }
            _ => {
                words.push(args[i].clone());
                i += 1;
            }
        }
    }

    if words.is_empty() {
        print_usage(program);
        std::process::exit(1);
    }

    let mut config = match &config_path {
        Some(path) => EmbedderConfig::from_json_file(path)?,
        None => default_config(),
    };
    if let Some(len) = max_char_len {
        config = config.with_max_char_len(len);
    }
    if raw_chars {
        config = config.with_input_mode(InputMode::RawCharacters);
    }

    let dict = match &dict_path {
        Some(path) => Dictionary::load_file(path)?,
        None => Dictionary::from_words(words.iter().map(String::as_str)),
    };
    tracing::debug!(vocab_size = dict.len(), "Loaded dictionary");

    let embedder = CharacterTokenEmbedder::new(dict, &config).context("Failed to build embedder")?;
    let snapshot = embedder.snapshot();

    let output = if raw_chars {
        let codec = CharacterCodec::new(embedder.max_char_len());
        let mut chars = Array3::<CharCode>::zeros((1, words.len(), codec.max_char_len()));
        for (pos, word) in words.iter().enumerate() {
            if word == EOS_SYMBOL {
                chars[[0, pos, 0]] = CHAR_EOS;
                continue;
            }
            let (row, truncated) = codec.encode(word.as_bytes());
            if truncated {
                tracing::info!(word = %word, "Truncated to {} characters", codec.max_char_len());
            }
            for (j, code) in row.into_iter().enumerate() {
                chars[[0, pos, j]] = code;
            }
        }
        embedder.embed(EmbedderInput::Chars(chars.view()))?
    } else {
        let ids: Vec<u32> = words.iter().map(|w| snapshot.vocab().index(w) as u32).collect();
        let ids = Array2::from_shape_vec((1, words.len()), ids)?;
        embedder.embed(EmbedderInput::Tokens(ids.view()))?
    };

    println!("Embedding dim: {}", embedder.embedding_dim());
    for (pos, word) in words.iter().enumerate() {
        let vector = output.slice(ndarray::s![0, pos, ..]);
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        let preview: Vec<String> = vector.iter().take(PREVIEW).map(|v| format!("{:.4}", v)).collect();
        if raw_chars {
            println!("{:<16} norm={:.4} [{}, ...]", word, norm, preview.join(", "));
        } else {
            println!(
                "{:<16} id={:<6} norm={:.4} [{}, ...]",
                word,
                snapshot.vocab().index(word),
                norm,
                preview.join(", ")
            );
        }
    }

    Ok(())
}
