use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Print contacts, favorites first")]
    List {
        #[arg(
            short,
            long,
            value_name = "TEXT",
            help = "Only show contacts whose name or phone contains TEXT"
        )]
        query: Option<String>,

        #[arg(long, default_value_t = false, help = "Only show favorites")]
        favorites: bool,
    },
    #[command(about = "Add a contact")]
    Add {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(short, long, value_name = "PHONE")]
        phone: Option<String>,

        #[arg(short, long, value_name = "EMAIL")]
        email: Option<String>,
    },
    #[command(about = "Rewrite a contact's name, phone, and email")]
    Edit {
        #[arg(value_name = "ID")]
        id: i64,

        #[arg(value_name = "NAME")]
        name: String,

        #[arg(short, long, value_name = "PHONE")]
        phone: Option<String>,

        #[arg(short, long, value_name = "EMAIL")]
        email: Option<String>,
    },
    #[command(about = "Delete a contact")]
    Rm {
        #[arg(value_name = "ID")]
        id: i64,
    },
    #[command(about = "Toggle a contact's favorite flag")]
    Fav {
        #[arg(value_name = "ID")]
        id: i64,
    },
    #[command(about = "Merge contacts from the remote endpoint, deduplicated by phone number")]
    Import {
        #[arg(long, value_name = "URL", help = "Override the configured import endpoint")]
        url: Option<String>,
    },
}
