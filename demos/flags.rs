use clap::Parser;
use log::info;

use magic_rs::config::{VerifierConfig, MAGIC_CONSTANT};
use magic_rs::program::{Annotation, AttributeValue, Program};
use magic_rs::slicing::NoSlicer;
use magic_rs::types::Type;
use magic_rs::verifier::Verifier;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Style passed to `Font.deriveFont(int style)`.
    #[arg(value_name = "INT", allow_negative_numbers = true)]
    style: i64,

    /// Declare the styles as an enumeration instead of flags.
    #[clap(long)]
    exclusive: bool,

    /// Maximum length of the allowed-values list in messages.
    #[clap(long, value_name = "INT", default_value = "300")]
    display_limit: usize,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    // @MagicConstant(flags = {Font.PLAIN, Font.BOLD, Font.ITALIC})
    let mut p = Program::new();
    let magic = p.add_annotation_type(MAGIC_CONSTANT);
    let font = p.add_class("java.awt.Font");
    let styles = [("PLAIN", 0), ("BOLD", 1), ("ITALIC", 2)].map(|(name, v)| p.add_constant(font, name, Type::Int, v));
    let derive = p.add_method(font, "deriveFont", Type::Class(font));
    let style = p.add_parameter(derive, "style", Type::Int);
    let members = AttributeValue::Array(styles.iter().map(|&s| p.reference(s)).collect());
    let attribute = if args.exclusive { "intValues" } else { "flags" };
    p.annotate(style, Annotation::new(magic).with(attribute, members));

    let value = p.int(args.style);
    let call = p.call(derive, [value]);
    info!("program: {} expressions, {} symbols", p.num_exprs(), p.num_symbols());

    let config = VerifierConfig::default().with_display_limit(args.display_limit);
    let verifier = Verifier::new(&p, NoSlicer).with_config(config);

    let domain = verifier.enumerate_domain(style)?;
    if let Some(domain) = &domain {
        println!("domain = {} {{{}}}", domain.kind(), domain.render_members(&p));
    }

    match verifier.check_argument(call, 0, derive)? {
        None => println!("Font.deriveFont({}): ok", args.style),
        Some(diagnostic) => println!("Font.deriveFont({}): {}", args.style, diagnostic.message(&p)),
    }

    Ok(())
}
