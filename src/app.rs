use crate::cache::{
  CachePolicy, LocalSource, LocalStore, MemoryCache, MemoryStore, PersistentStore, Repository,
  SourcePolicy, SqliteStore, TieredRepository,
};
use crate::commands::{self, ShellCommand};
use crate::config::Config;
use crate::country::client::RestCountriesClient;
use crate::country::search::{self, SortCriteria};
use crate::country::types::Country;
use crate::country::usecases::{FetchCountries, SearchCountries, SelectedCountries};
use crate::error::CoreError;
use crate::query::Query;
use crate::render;
use clap::Subcommand;
use color_eyre::{eyre::eyre, Report, Result, Section};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

type CountryRepository<S> =
  TieredRepository<Country, RestCountriesClient, LocalStore<Country, S>>;

/// What to run
#[derive(Subcommand, Debug, Clone)]
pub enum Action {
  /// List all countries
  List {
    /// Where to read from (default: decided from the state of the local cache)
    #[arg(short, long, value_enum)]
    policy: Option<SourcePolicy>,
    #[arg(short, long, value_enum, default_value = "name")]
    sort: SortCriteria,
    /// Only show countries whose name, capital or region contains this text
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// Search countries by name
  Search { query: String },
  /// Show details for one country
  Show { name: String },
  /// Manage selected countries
  Selected {
    #[command(subcommand)]
    action: Option<SelectedAction>,
  },
  /// Inspect or manage the local cache
  Cache {
    #[command(subcommand)]
    action: Option<CacheAction>,
  },
  /// Interactive shell
  Shell,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SelectedAction {
  /// List selected countries
  List,
  /// Add a country to the selection
  Add { name: String },
  /// Remove a country from the selection
  Remove { name: String },
  /// Remove every selected country
  Clear,
  /// Show the selection, selecting the default country if it is empty
  Init,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheAction {
  /// Show what is stored and whether it is fresh
  Status,
  /// Re-download the country list
  Refresh,
  /// Delete the stored country list
  Clear,
}

/// Open the configured store and run `action`.
pub async fn run(config: Config, offline: bool, action: Action) -> Result<()> {
  if config.cache.persist {
    let store = match &config.cache.path {
      Some(path) => SqliteStore::open(path),
      None => SqliteStore::open_default(),
    }
    .map_err(explain)?;
    App::new(config, Arc::new(store), offline)?.run(action).await
  } else {
    App::new(config, Arc::new(MemoryStore::new()), offline)?
      .run(action)
      .await
  }
}

/// Main application state
pub struct App<S> {
  config: Config,
  /// Never touch the network
  offline: bool,
  local: Arc<LocalStore<Country, S>>,
  repository: Arc<CountryRepository<S>>,
  fetch: FetchCountries<CountryRepository<S>>,
  search: Arc<SearchCountries<CountryRepository<S>>>,
  selected: SelectedCountries<CountryRepository<S>>,
  /// Last full list, for in-memory filtering in the shell
  loaded: MemoryCache<Country>,
}

impl<S: PersistentStore + 'static> App<S> {
  pub fn new(config: Config, store: Arc<S>, offline: bool) -> Result<Self> {
    let remote = Arc::new(
      RestCountriesClient::new(&config.api).map_err(|e| eyre!("Invalid API settings: {}", e))?,
    );
    let local = Arc::new(LocalStore::new(store));
    let expiration = chrono::Duration::try_seconds(config.cache.expiration_secs).ok_or_else(|| {
      eyre!(
        "cache.expiration_secs is out of range: {}",
        config.cache.expiration_secs
      )
    })?;
    let cache_policy = CachePolicy::new(expiration);
    let repository =
      Arc::new(TieredRepository::new(remote, local.clone()).with_cache_policy(cache_policy));

    Ok(Self {
      fetch: FetchCountries::new(repository.clone()),
      search: Arc::new(SearchCountries::new(repository.clone())),
      selected: SelectedCountries::new(repository.clone()).with_max_selected(config.max_selected),
      loaded: MemoryCache::new(),
      config,
      offline,
      local,
      repository,
    })
  }

  pub async fn run(&self, action: Action) -> Result<()> {
    debug!(?action, offline = self.offline, "running");
    match action {
      Action::List {
        policy,
        sort,
        filter,
      } => {
        let countries = self
          .fetch
          .execute(self.policy(policy))
          .await
          .map_err(explain)?;
        let countries = self.search.filter(filter.as_deref().unwrap_or(""), &countries);
        println!("{}", render::country_table(&self.search.sort(&countries, sort)));
      }
      Action::Search { query } => {
        let found = self.search_countries(&query).await?;
        println!("{}", render::country_table(&found));
      }
      Action::Show { name } => {
        let country = self.find_country(&name).await?;
        println!("{}", render::country_details(&country));
      }
      Action::Selected { action } => {
        self
          .run_selected(action.unwrap_or(SelectedAction::List))
          .await?
      }
      Action::Cache { action } => self.run_cache(action.unwrap_or(CacheAction::Status)).await?,
      Action::Shell => self.run_shell().await?,
    }
    Ok(())
  }

  /// `--offline` wins over everything, then the explicit policy, then config.
  fn policy(&self, requested: Option<SourcePolicy>) -> Option<SourcePolicy> {
    if self.offline {
      Some(SourcePolicy::LocalOnly)
    } else {
      requested.or(self.config.default_policy)
    }
  }

  async fn search_countries(&self, query: &str) -> Result<Vec<Country>> {
    if self.offline {
      let stored = self
        .fetch
        .execute(Some(SourcePolicy::LocalOnly))
        .await
        .map_err(explain)?;
      return Ok(self.search.filter(query, &stored));
    }
    self.search.execute(query).await.map_err(explain)
  }

  /// Resolve a name against the full list, then against a name search.
  async fn find_country(&self, name: &str) -> Result<Country> {
    let countries = self.load_list().await?;
    if let Some(country) = search::find_by_name(name, &countries) {
      return Ok(country.clone());
    }

    if !self.offline {
      let found = self.search.execute(name).await.map_err(explain)?;
      if let Some(country) = search::find_by_name(name, &found) {
        return Ok(country.clone());
      }
    }

    Err(eyre!("No country named '{}'", name))
  }

  async fn load_list(&self) -> Result<Vec<Country>> {
    let policy = self.policy(None);
    Ok(
      self
        .loaded
        .get_or_try_load(|| self.fetch.execute(policy))
        .await
        .map_err(explain)?,
    )
  }

  async fn run_selected(&self, action: SelectedAction) -> Result<()> {
    match action {
      SelectedAction::List => self.print_selected().await?,
      SelectedAction::Add { name } => println!("{}", self.add_selected(&name).await?),
      SelectedAction::Remove { name } => println!("{}", self.remove_selected(&name).await?),
      SelectedAction::Clear => {
        self.selected.clear().await?;
        println!("Selection cleared");
      }
      SelectedAction::Init => {
        let selected = self
          .selected
          .load_or_default(&self.search, &self.config.default_country)
          .await?;
        println!("{}", render::country_table(&selected));
      }
    }
    Ok(())
  }

  async fn print_selected(&self) -> Result<()> {
    let selected = self.selected.fetch().await?;
    println!(
      "{}\n({} of {} selected)",
      render::country_table(&selected),
      selected.len(),
      self.selected.max_selected()
    );
    Ok(())
  }

  async fn add_selected(&self, name: &str) -> Result<String> {
    let country = self.find_country(name).await?;
    let common = country.name.common.clone();
    if self.selected.add(country).await? {
      Ok(format!("Added {}", common))
    } else {
      Ok(format!(
        "{} not added: already selected or {} countries selected",
        common,
        self.selected.max_selected()
      ))
    }
  }

  async fn remove_selected(&self, name: &str) -> Result<String> {
    let selected = self.selected.fetch().await?;
    let Some(country) = search::find_by_name(name, &selected) else {
      return Ok(format!("{} is not selected", name));
    };
    self.selected.remove(&country.id).await?;
    Ok(format!("Removed {}", country.name.common))
  }

  async fn run_cache(&self, action: CacheAction) -> Result<()> {
    match action {
      CacheAction::Status => {
        let stored = match self.local.fetch().await {
          Ok(countries) => format!("{} countries", countries.len()),
          Err(e) => format!("nothing stored ({})", e),
        };
        let updated = self
          .local
          .last_update_time()
          .await
          .map(|t| t.to_rfc3339())
          .unwrap_or_else(|| "never".to_string());
        let fresh = self.repository.has_valid_local_data().await;

        println!("Stored:       {}", stored);
        println!("Last update:  {}", updated);
        println!(
          "Fresh:        {} (window {}s)",
          if fresh { "yes" } else { "no" },
          self.config.cache.expiration_secs
        );
        println!("Selected:     {}", self.selected.fetch().await?.len());
      }
      CacheAction::Refresh => println!("{}", self.refresh().await?),
      CacheAction::Clear => {
        self.repository.clear_local_storage().await?;
        self.loaded.clear().await;
        println!("Cache cleared");
      }
    }
    Ok(())
  }

  /// Re-download the list. Returns a summary saying whether it reached
  /// local storage.
  async fn refresh(&self) -> Result<String> {
    if self.offline {
      return Err(eyre!("Cannot refresh while offline"));
    }
    let countries = self
      .fetch
      .execute(Some(SourcePolicy::RemoteOnly))
      .await
      .map_err(explain)?;
    info!(count = countries.len(), "refreshed country list");
    Ok(self.keep_refreshed(countries).await)
  }

  async fn keep_refreshed(&self, countries: Vec<Country>) -> String {
    let count = countries.len();
    self.loaded.store(countries).await;

    // Write-through is best-effort; only a fresh stamp proves it landed
    if self.repository.has_valid_local_data().await {
      format!("Fetched and stored {} countries", count)
    } else {
      format!(
        "Fetched {} countries, but saving them locally failed (see log)",
        count
      )
    }
  }

  async fn run_shell(&self) -> Result<()> {
    let mut view = ShellView::new(self.load_list().await?);
    let mut pending_search: Option<Query<Vec<Country>>> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{} countries loaded. Type 'help' for commands.", view.base.len());
    prompt()?;

    loop {
      let event = tokio::select! {
        line = lines.next_line() => ShellEvent::Line(line?),
        _ = settled(&mut pending_search) => ShellEvent::SearchSettled,
      };

      match event {
        ShellEvent::Line(None) => break,
        ShellEvent::Line(Some(line)) => match commands::parse(&line) {
          Ok(None) => {}
          Ok(Some(ShellCommand::Quit)) => break,
          Ok(Some(ShellCommand::Search(term))) if !self.offline => {
            if pending_search.as_ref().is_some_and(|q| q.is_loading()) {
              println!("Previous search cancelled");
            }
            // Replacing the query drops the previous one, aborting its request
            pending_search = Some(self.start_search(term));
            println!("Searching...");
          }
          Ok(Some(command)) => {
            if command == ShellCommand::Clear {
              pending_search = None;
            }
            if let Err(e) = self.execute_shell(command, &mut view).await {
              println!("Error: {}", e);
            }
          }
          Err(message) => println!("{}", message),
        },
        ShellEvent::SearchSettled => {
          if let Some(query) = pending_search.take() {
            if let Some(found) = query.data() {
              view.show(found.clone());
              println!("{}", render::country_table(&view.visible()));
            } else if let Some(e) = query.error() {
              println!("Search failed: {}", e);
            }
          }
        }
      }
      prompt()?;
    }

    Ok(())
  }

  fn start_search(&self, term: String) -> Query<Vec<Country>> {
    let search = self.search.clone();
    let mut query = Query::new(move || {
      let search = search.clone();
      let term = term.clone();
      async move { search.execute(&term).await.map_err(|e| e.to_string()) }
    });
    query.fetch();
    query
  }

  async fn execute_shell(&self, command: ShellCommand, view: &mut ShellView) -> Result<()> {
    match command {
      ShellCommand::Search(term) => {
        view.show(self.search_countries(&term).await?);
        println!("{}", render::country_table(&view.visible()));
      }
      ShellCommand::Filter(text) => {
        view.filter = text;
        println!("{}", render::country_table(&view.visible()));
      }
      ShellCommand::Sort(criteria) => {
        view.sort = criteria;
        println!("{}", render::country_table(&view.visible()));
      }
      ShellCommand::Show(name) => {
        let country = match search::find_by_name(&name, &view.visible()) {
          Some(country) => country.clone(),
          None => self.find_country(&name).await?,
        };
        println!("{}", render::country_details(&country));
      }
      ShellCommand::Add(name) => println!("{}", self.add_selected(&name).await?),
      ShellCommand::Remove(name) => println!("{}", self.remove_selected(&name).await?),
      ShellCommand::Selected => self.print_selected().await?,
      ShellCommand::Refresh => {
        let summary = self.refresh().await?;
        view.show(self.load_list().await?);
        println!("{}", summary);
      }
      ShellCommand::Clear => {
        view.show(self.load_list().await?);
        println!("{}", render::country_table(&view.visible()));
      }
      ShellCommand::Help => println!("{}", commands::help_text()),
      ShellCommand::Quit => {}
    }
    Ok(())
  }
}

enum ShellEvent {
  /// A line of input, or `None` at end of input
  Line(Option<String>),
  SearchSettled,
}

/// What the shell is currently showing
struct ShellView {
  /// Full list, or the last search result
  base: Vec<Country>,
  filter: String,
  sort: SortCriteria,
}

impl ShellView {
  fn new(base: Vec<Country>) -> Self {
    Self {
      base,
      filter: String::new(),
      sort: SortCriteria::Name,
    }
  }

  /// Show a new result set; the active filter is dropped, the sort kept.
  fn show(&mut self, base: Vec<Country>) {
    self.base = base;
    self.filter.clear();
  }

  fn visible(&self) -> Vec<Country> {
    search::sort(&search::filter(&self.filter, &self.base), self.sort)
  }
}

/// Classify an error into the `CoreError` taxonomy and attach a hint for
/// the kinds a user can act on. A `CoreError` passes through unchanged.
fn explain(err: impl Into<Report>) -> Report {
  let err = CoreError::from_report(err.into());
  let hint = if err.is_network() {
    Some("Check your connection, or pass --offline to use the local cache")
  } else if err == CoreError::NotFound {
    Some("Nothing is cached yet; run `countries cache refresh` while online")
  } else {
    None
  };
  let report = Report::new(err);
  match hint {
    Some(hint) => report.suggestion(hint),
    None => report,
  }
}

async fn settled<T: Send + 'static>(query: &mut Option<Query<T>>) -> bool {
  match query {
    Some(query) => query.settled().await,
    None => std::future::pending().await,
  }
}

fn prompt() -> Result<()> {
  print!("> ");
  std::io::stdout().flush()?;
  Ok(())
}
