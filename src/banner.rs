//! Interactive banner and target prompt

use std::io::{self, BufRead, Write};

/// Default target when the prompt is left empty
pub const DEFAULT_TARGET_URL: &str =
    "https://www.tk.de/techniker/versicherung/tk-leistungen/weitere-leistungen-2078462";

const BANNER: &str = r"
██████╗ ███████╗███╗   ███╗███████╗███╗   ██╗████████╗ ██████╗ ██████╗
██╔══██╗██╔════╝████╗ ████║██╔════╝████╗  ██║╚══██╔══╝██╔═══██╗██╔══██╗
██║  ██║█████╗  ██╔████╔██║█████╗  ██╔██╗ ██║   ██║   ██║   ██║██████╔╝
██║  ██║██╔══╝  ██║╚██╔╝██║██╔══╝  ██║╚██╗██║   ██║   ██║   ██║██╔══██╗
██████╔╝███████╗██║ ╚═╝ ██║███████╗██║ ╚████║   ██║   ╚██████╔╝██║  ██║
╚═════╝ ╚══════╝╚═╝     ╚═╝╚══════╝╚═╝  ╚═══╝   ╚═╝    ╚═════╝ ╚═╝  ╚═╝
";

/// Prints the startup banner
pub fn print_banner() {
    println!("{}", BANNER);
    println!("Der dunkle Wächter des Webs - saugt alle URLs aus jeder Seite.");
    println!("Kein Link bleibt vor dem Dementor verborgen.\n");
}

/// Prompts interactively for a target URL
///
/// Empty input falls back to the default target; callers run the result
/// through [`crate::fetch::Target::from_user_input`], which adds a missing
/// `https://` prefix.
pub fn prompt_for_url() -> io::Result<String> {
    print!("Ziel-URL eingeben (z.B. https://example.com): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let input = line.trim();
    if input.is_empty() {
        println!("Keine URL eingegeben, verwende Standard-URL.");
        Ok(DEFAULT_TARGET_URL.to_string())
    } else {
        Ok(input.to_string())
    }
}
