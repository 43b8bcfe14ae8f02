use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "resym",
    version,
    about = "Structural refactoring engine for TypeScript/JavaScript projects",
    after_help = "All file paths may be project-relative or absolute; forward and back \
                  slashes are treated identically. Batch and parse input defaults to stdin. \
                  Failed batches are rolled back to a byte-identical pre-batch state."
)]
pub struct Cli {
    /// Project root directory
    #[arg(long, global = true, default_value = ".")]
    pub root: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rename a declaration and every reference to it.
    ///
    /// Rewrites the declaration, plain and aliased imports,
    /// re-exports, and namespace-qualified uses. Alias names stay;
    /// only the name they point at changes.
    Rename {
        /// File declaring the symbol
        file: String,
        /// Symbol name
        name: String,
        /// New name
        #[arg(long)]
        to: String,
        /// Symbol kind (function, class, interface, type, variable, method, property, getter, setter, enum, namespace)
        #[arg(short, long, default_value = "function")]
        kind: String,
        /// Restrict to a named enclosing class
        #[arg(long)]
        in_class: Option<String>,
        /// Restrict to a named enclosing function
        #[arg(long)]
        in_function: Option<String>,
        /// Collision checking scope: file or project
        #[arg(long, default_value = "project")]
        collision_scope: String,
    },

    /// Move a top-level declaration to another module.
    ///
    /// Carries sibling dependencies as imports from the original
    /// module and rewires every importer project-wide; mixed import
    /// declarations are split.
    Move {
        /// File declaring the symbol
        file: String,
        /// Symbol name
        name: String,
        /// Destination file (created when missing)
        #[arg(long)]
        dest: String,
        /// Symbol kind
        #[arg(short, long, default_value = "function")]
        kind: String,
        /// Copy instead of move (leave the source declaration in place)
        #[arg(long)]
        copy: bool,
    },

    /// Remove a top-level declaration.
    ///
    /// Fails when the symbol still has external referents unless
    /// --force is given.
    Remove {
        /// File declaring the symbol
        file: String,
        /// Symbol name
        name: String,
        /// Symbol kind
        #[arg(short, long, default_value = "function")]
        kind: String,
        /// Remove even when the symbol is still referenced
        #[arg(long)]
        force: bool,
        /// Also delete imports used only by the removed declaration
        #[arg(long)]
        cleanup: bool,
    },

    /// Execute a JSON batch of operations with snapshot/rollback.
    Batch {
        /// Path to a JSON batch request (defaults to stdin)
        #[arg(long)]
        file: Option<String>,
        /// Abort at the first failing operation
        #[arg(long)]
        stop_on_error: Option<bool>,
    },

    /// Extract operations from loosely formatted text.
    ///
    /// Accepts fenced code blocks, <operations> tags, relaxed quoting
    /// and trailing commas. Prints the validated operations; --execute
    /// runs them as a batch.
    Parse {
        /// Text to parse (defaults to stdin)
        #[arg(long)]
        text: Option<String>,
        /// Execute the extracted operations as a batch
        #[arg(long)]
        execute: bool,
    },

    /// Find all references of a symbol.
    Refs {
        /// File declaring the symbol
        file: String,
        /// Symbol name
        name: String,
        /// Symbol kind
        #[arg(short, long, default_value = "function")]
        kind: String,
        /// Restrict to a named enclosing class
        #[arg(long)]
        in_class: Option<String>,
    },
}
