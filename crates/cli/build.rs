use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("favea")
        .version("0.1.0")
        .author("Favea Contributors")
        .about("Collect idol event and ticket deadline info from web pages")
        .arg(clap::arg!(<INPUT> "Direct http(s) URL to collect from, or a keyword to search for"))
        .arg(clap::arg!(--json "Print the extraction result as JSON instead of a summary"))
        .arg(clap::arg!(--timeout <SECS> "Page rendering timeout in seconds").default_value("60"))
        .arg(clap::arg!(--reader_endpoint <URL> "Reader (page rendering) service endpoint").value_name("URL"))
        .arg(clap::arg!(--llm_endpoint <URL> "Chat-completions endpoint for the extraction model").value_name("URL"))
        .arg(clap::arg!(--model <MODEL> "Model identifier").value_name("MODEL"))
        .arg(clap::arg!(-v --verbose "Enable verbose progress output"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "favea", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "favea", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "favea", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "favea", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
