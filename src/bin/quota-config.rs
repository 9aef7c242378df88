use {
    quota_warning::{
        editor::{self, ConfigDocument},
        errors::Result,
        flags::EditorFlags,
    },
    std::{path::Path, process},
};

fn main() {
    if let Err(err) = run(&EditorFlags::args()) {
        eprintln!("Abort: {}", err);
        process::exit(err.exit_code());
    }
}

fn run(opt: &EditorFlags) -> Result<()> {
    let path = Path::new(&opt.config);
    let created = !path.is_file();
    if created {
        println!("{} not found, starting from the example config.", opt.config);
    }
    let fields = editor::fields_to_edit(&opt.mode())?;
    let doc = ConfigDocument::load(path)?;
    let edits = editor::stdin_edits(&doc, &fields)?;
    let changed = !edits.is_empty();
    let doc = doc.apply(edits);
    print!("{}", doc.summary());
    if changed || created {
        doc.save(path)?;
        println!("Saved {}", opt.config);
    }
    return Ok(());
}
