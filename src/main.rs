use anyhow::{Context, Result};
use clap::Parser;
use collocate::cli::{Cli, OutputFormat};
use collocate::corpus::Corpus;
use collocate::gram_filter::UdTagset;
use collocate::json_output::JsonReport;
use collocate::ngram::{NgramConfig, RequiredWord};
use collocate::schema::SchemaDescriptor;
use collocate::store::MemoryStore;
use collocate::table::{
    bigram_table, chain_rule_table, topic_word_table, NgramTable, TopicWordTable,
    TOPIC_COEF_FAIL, TOPIC_COEF_SUCCESS,
};
use collocate::csv_output;
use std::collections::HashSet;
use std::fs;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_stopwords(cli: &Cli) -> Result<HashSet<String>> {
    let Some(path) = &cli.stopwords else {
        return Ok(HashSet::new());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read stopword file {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn ngram_config(cli: &Cli) -> Result<NgramConfig> {
    let mut config = NgramConfig::new(cli.n)?;
    config.min_count = cli.min_count;
    config.backfill_cap = cli.backfill_cap;
    config.include_word = cli.include_word.as_ref().map(|word| RequiredWord {
        word: word.clone(),
        match_lemma: cli.word_is_lemma,
        split_compounds: cli.split_compounds,
    });
    config.pos_patterns = cli
        .pos_patterns
        .iter()
        .map(|p| p.split(',').map(|c| c.trim().to_string()).collect())
        .collect();
    Ok(config)
}

fn print_ngram_table(table: &NgramTable, n: usize, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{:<40} {:>8} {:>12} {:>10}", "ngram", "freq", "LL", "PMI");
            for row in &table.rows {
                println!(
                    "{:<40} {:>8} {:>12.4} {:>10.4}",
                    row.ngram, row.freq, row.ll, row.pmi
                );
            }
            if table.dropped > 0 {
                eprintln!("{} gram(s) dropped (undefined measures)", table.dropped);
            }
        }
        OutputFormat::Json => println!("{}", JsonReport::ngrams(table, n).to_json()?),
        OutputFormat::Csv => print!("{}", csv_output::ngram_csv(table)),
    }
    Ok(())
}

fn print_topic_table(table: &TopicWordTable, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{:<30} {:>8} {:>14}", "lemma", "freq", "NB");
            for row in &table.rows {
                println!("{:<30} {:>8} {:>14.4}", row.lemma, row.freq, row.nb);
            }
            if table.dropped > 0 {
                eprintln!("{} lemma(s) dropped (undefined salience)", table.dropped);
            }
        }
        OutputFormat::Json => println!("{}", JsonReport::topic_words(table).to_json()?),
        OutputFormat::Csv => print!("{}", csv_output::topic_word_csv(table)),
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let content = fs::read_to_string(&cli.corpus)
        .with_context(|| format!("failed to read corpus file {}", cli.corpus.display()))?;
    let store = MemoryStore::parse(&content).context("failed to parse corpus file")?;
    let expander = UdTagset;

    let schema = if cli.lemmas {
        SchemaDescriptor::lemmas()
    } else {
        SchemaDescriptor::tokens()
    };
    let mut corpus = Corpus::new(&store, &expander, &cli.language, schema);
    if cli.docs.is_empty() {
        corpus.set_full_corpus()?;
    } else {
        corpus.set_subcorpus(&cli.docs)?;
    }
    corpus.set_stopwords(load_stopwords(cli)?);
    corpus.count_all_words()?;

    if cli.topic_words {
        corpus.set_noun_frequencies()?;
        let table = topic_word_table(&corpus, TOPIC_COEF_SUCCESS, TOPIC_COEF_FAIL)?;
        return print_topic_table(&table, cli.format);
    }

    corpus.set_word_frequencies()?;

    let config = ngram_config(cli)?;
    let table = if cli.n == 2 {
        compute_ngrams(&mut corpus, &config, cli.per_document)?;
        bigram_table(&mut corpus)?
    } else {
        // The order-2 cache is the prerequisite for chain-rule scoring; the
        // optional word/POS filters only constrain the requested order.
        let mut bigram_config = NgramConfig::new(2)?;
        bigram_config.min_count = config.min_count;
        bigram_config.backfill_cap = config.backfill_cap;
        compute_ngrams(&mut corpus, &bigram_config, cli.per_document)?;
        bigram_table(&mut corpus)?;

        compute_ngrams(&mut corpus, &config, cli.per_document)?;
        chain_rule_table(&mut corpus, cli.n)?
    };
    print_ngram_table(&table, cli.n, cli.format)
}

fn compute_ngrams(
    corpus: &mut Corpus,
    config: &NgramConfig,
    per_document: bool,
) -> std::result::Result<(), collocate::error::CollocateError> {
    if per_document {
        corpus.set_ngram_frequencies_per_document(config)
    } else {
        corpus.set_ngram_frequencies(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    run(&cli)
}
