use std::io::{BufRead, Write};

use scriptbook::{Draft, Editor, ScriptBook};

fn default_store_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.scriptbook/scripts.json")
}

fn print_list(editor: &Editor) {
    if editor.entries().is_empty() {
        println!("(no scripts)");
        return;
    }
    for (i, entry) in editor.entries().iter().enumerate() {
        if entry.description.is_empty() {
            println!("{:>3}. {} — {}", i + 1, entry.name, entry.command);
        } else {
            println!(
                "{:>3}. {} — {} ({})",
                i + 1,
                entry.name,
                entry.command,
                entry.description
            );
        }
    }
}

fn prompt(out: &mut impl Write, lines: &mut impl Iterator<Item = std::io::Result<String>>, label: &str) -> Option<String> {
    write!(out, "{label}: ").ok()?;
    out.flush().ok()?;
    lines.next()?.ok()
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(default_store_path);
    let book = ScriptBook::new(&path)?;
    let mut editor = Editor::new(book)?;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut out = std::io::stdout();

    println!("scriptbook — {path}");
    loop {
        println!();
        print_list(&editor);
        let Some(choice) = prompt(&mut out, &mut lines, "[a]dd, [d]elete N, [q]uit") else {
            break;
        };

        match choice.trim() {
            "a" => {
                editor.open_form();
                let Some(name) = prompt(&mut out, &mut lines, "name") else { break };
                let Some(command) = prompt(&mut out, &mut lines, "command") else { break };
                let Some(description) = prompt(&mut out, &mut lines, "description") else {
                    break;
                };
                match editor.submit(Draft {
                    name,
                    command,
                    description,
                }) {
                    Ok(()) => println!("saved"),
                    Err(e) => {
                        eprintln!("error: {e}");
                        editor.cancel();
                    }
                }
            }
            "q" | "" => break,
            other => {
                if let Some(n) = other.strip_prefix('d').map(str::trim) {
                    match n.parse::<usize>() {
                        Ok(position) if position >= 1 => match editor.delete(position - 1) {
                            Ok(()) => println!("deleted"),
                            Err(e) => eprintln!("error: {e}"),
                        },
                        _ => eprintln!("error: expected 'd N' with a list position"),
                    }
                } else {
                    eprintln!("error: unknown command '{other}'");
                }
            }
        }
    }

    Ok(())
}
