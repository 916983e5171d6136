use clap::{Parser, Subcommand};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::{json, Value};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "leo-cli")]
#[command(about = "Management CLI for the LeoConnect backend", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is up
    Health,
    /// Log in and print the issued token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the profile behind a token
    Profile {
        #[arg(long)]
        token: String,
    },
    /// Run register → login → profile, then check that missing and bogus tokens are rejected
    VerifyAuth,
}

struct Api {
    client: reqwest::Client,
    base: String,
}

impl Api {
    fn new(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    async fn get(&self, path: &str, token: Option<&str>) -> CliResult<(StatusCode, Value)> {
        let mut req = self.client.get(format!("{}{}", self.base, path));
        if let Some(token) = token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        read(req.send().await?).await
    }

    async fn post(&self, path: &str, body: &Value) -> CliResult<(StatusCode, Value)> {
        let res = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(body)
            .send()
            .await?;
        read(res).await
    }
}

async fn read(res: reqwest::Response) -> CliResult<(StatusCode, Value)> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Ok((status, body))
}

fn print(status: StatusCode, body: &Value) -> CliResult<()> {
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}

fn expect(step: &str, expected: StatusCode, status: StatusCode, body: &Value) -> CliResult<()> {
    if status == expected {
        println!("ok   {step} ({status})");
        Ok(())
    } else {
        Err(format!("{step}: expected {expected}, got {status}: {body}").into())
    }
}

async fn verify_auth(api: &Api) -> CliResult<()> {
    let email = format!("verify-{}@example.com", uuid::Uuid::new_v4().simple());
    let password = "password123";

    let (status, body) = api
        .post(
            "/api/auth/register",
            &json!({
                "username": "verifyuser",
                "email": email,
                "password": password,
                "leoDistrict": "306 A1",
                "clubName": "Verification Club",
            }),
        )
        .await?;
    expect("register", StatusCode::CREATED, status, &body)?;

    let (status, body) = api
        .post(
            "/api/auth/login",
            &json!({ "email": email, "password": password }),
        )
        .await?;
    expect("login", StatusCode::OK, status, &body)?;
    let token = body["token"]
        .as_str()
        .ok_or("login response has no token")?
        .to_string();

    let (status, body) = api.get("/api/auth/profile", Some(&token)).await?;
    expect("profile with token", StatusCode::OK, status, &body)?;

    let (status, body) = api.get("/api/auth/profile", None).await?;
    expect("profile without token", StatusCode::UNAUTHORIZED, status, &body)?;

    let (status, body) = api.get("/api/auth/profile", Some("invalidtoken")).await?;
    expect("profile with bogus token", StatusCode::UNAUTHORIZED, status, &body)?;

    println!("Authentication flow verified");
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let api = Api::new(&cli.url);

    match cli.command {
        Commands::Health => {
            let (status, body) = api.get("/health", None).await?;
            print(status, &body)?;
        }
        Commands::Login { email, password } => {
            let (status, body) = api
                .post(
                    "/api/auth/login",
                    &json!({ "email": email, "password": password }),
                )
                .await?;
            print(status, &body)?;
        }
        Commands::Profile { token } => {
            let (status, body) = api.get("/api/auth/profile", Some(&token)).await?;
            print(status, &body)?;
        }
        Commands::VerifyAuth => verify_auth(&api).await?,
    }

    Ok(())
}
