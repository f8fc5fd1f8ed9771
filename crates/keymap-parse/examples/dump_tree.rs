use std::io::Read;
use keymap_parse::Parser;
use keymap_tokenizer::Tokenizer;

fn main() {
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source).unwrap();

    println!("=== Tokens ===");
    for tok in Tokenizer::new(&source) {
        println!("{:?}", tok);
    }

    println!("\n=== Nodes ===");
    match Parser::new(&source).parse() {
        Ok(root) => {
            for node in root.walk() {
                println!(
                    "{} ({} properties, {} children)",
                    node.name,
                    node.properties.len(),
                    node.children.len()
                );
            }
        }
        Err(err) => println!("{}", err),
    }
}
