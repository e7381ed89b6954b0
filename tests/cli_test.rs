//! CLI Command Tests
//!
//! Tests for all CLI commands with mocked backends.
//! Covers JSON output format, exit codes, and input validation.

// =============================================================================
// CLI Argument Parsing Tests
// =============================================================================

mod cli_parsing {
    use clap::Parser;
    use moviestream::cli::{AdminAction, AdminCmd, Cli, Command, PlayerChoice, WatchlistAction};
    use moviestream::playback::PlayerType;

    #[test]
    fn test_no_args_is_tui_mode() {
        let cli = Cli::parse_from::<_, &str>([]);
        assert!(!cli.is_cli_mode());
    }

    #[test]
    fn test_short_aliases() {
        let cases = [
            (vec!["moviestream", "h"], "home"),
            (vec!["moviestream", "ls"], "movies"),
            (vec!["moviestream", "i", "m1"], "info"),
            (vec!["moviestream", "s", "heat"], "search"),
            (vec!["moviestream", "g"], "genres"),
            (vec!["moviestream", "p", "m1"], "play"),
            (vec!["moviestream", "wl"], "watchlist"),
        ];
        for (args, expected) in cases {
            let cli = Cli::parse_from(args);
            let name = match cli.command {
                Some(Command::Home(_)) => "home",
                Some(Command::Movies(_)) => "movies",
                Some(Command::Info(_)) => "info",
                Some(Command::Search(_)) => "search",
                Some(Command::Genres(_)) => "genres",
                Some(Command::Play(_)) => "play",
                Some(Command::Watchlist(_)) => "watchlist",
                _ => "other",
            };
            assert_eq!(name, expected);
        }
    }

    #[test]
    fn test_movies_default_limit() {
        let cli = Cli::parse_from(["moviestream", "movies"]);
        match cli.command {
            Some(Command::Movies(cmd)) => assert_eq!(cmd.limit, 30),
            _ => panic!("Expected Movies command"),
        }
    }

    #[test]
    fn test_search_query_required() {
        assert!(Cli::try_parse_from(["moviestream", "search"]).is_err());
        assert!(Cli::try_parse_from(["moviestream", "search", "x", "-y", "abc"]).is_err());
    }

    #[test]
    fn test_play_player_choice() {
        let cli = Cli::parse_from(["moviestream", "play", "m1", "-p", "vlc"]);
        match cli.command {
            Some(Command::Play(cmd)) => {
                assert_eq!(cmd.id, "m1");
                assert_eq!(cmd.player, Some(PlayerChoice::Vlc));
                assert_eq!(PlayerType::from(PlayerChoice::Vlc), PlayerType::Vlc);
            }
            _ => panic!("Expected Play command"),
        }
        assert!(Cli::try_parse_from(["moviestream", "play", "m1", "-p", "kodi"]).is_err());
    }

    #[test]
    fn test_watchlist_remove_alias() {
        let cli = Cli::parse_from(["moviestream", "watchlist", "rm", "m7"]);
        match cli.command {
            Some(Command::Watchlist(cmd)) => {
                assert_eq!(cmd.action, Some(WatchlistAction::Remove { id: "m7".into() }))
            }
            _ => panic!("Expected Watchlist command"),
        }
    }

    #[test]
    fn test_history_and_progress_flags() {
        let cli = Cli::parse_from(["moviestream", "history", "-l", "5"]);
        match cli.command {
            Some(Command::History(cmd)) => assert_eq!(cmd.limit, Some(5)),
            _ => panic!("Expected History command"),
        }

        let cli = Cli::parse_from(["moviestream", "progress", "m1", "--clear"]);
        match cli.command {
            Some(Command::Progress(cmd)) => {
                assert_eq!(cmd.id, "m1");
                assert!(cmd.clear);
            }
            _ => panic!("Expected Progress command"),
        }
    }

    #[test]
    fn test_admin_genre_add_with_slug() {
        let cli = Cli::parse_from([
            "moviestream",
            "admin",
            "genre-add",
            "Film Noir",
            "--slug",
            "noir",
        ]);
        match cli.command {
            Some(Command::Admin(AdminCmd {
                action: AdminAction::GenreAdd { name, slug },
            })) => {
                assert_eq!(name, "Film Noir");
                assert_eq!(slug.as_deref(), Some("noir"));
            }
            _ => panic!("Expected admin genre-add"),
        }
    }

    #[test]
    fn test_admin_requires_action() {
        assert!(Cli::try_parse_from(["moviestream", "admin"]).is_err());
        assert!(Cli::try_parse_from(["moviestream", "admin", "login"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "moviestream",
            "genres",
            "--json",
            "--storage",
            "/tmp/ms.json",
        ]);
        assert!(cli.json);
        assert_eq!(
            cli.storage.as_deref(),
            Some(std::path::Path::new("/tmp/ms.json"))
        );
    }
}

// =============================================================================
// JSON Output Tests
// =============================================================================

mod json_output {
    use moviestream::cli::{ExitCode, JsonOutput, ProgressStatus, StatusOk, WatchlistStatus};

    #[test]
    fn test_success_omits_error_and_code() {
        let output = JsonOutput::success(StatusOk::default());
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json, serde_json::json!({"data": {"status": "ok"}}));
    }

    #[test]
    fn test_error_carries_exit_code() {
        let output = JsonOutput::<()>::error_msg("Movie not found", ExitCode::NotFound);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Movie not found", "exit_code": 4})
        );
    }

    #[test]
    fn test_watchlist_status_shape() {
        let status = WatchlistStatus {
            movie_id: "m1".into(),
            in_watchlist: true,
            changed: false,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["movie_id"], "m1");
        assert_eq!(json["in_watchlist"], true);
        assert_eq!(json["changed"], false);
    }

    #[test]
    fn test_missing_progress_is_null() {
        let status = ProgressStatus {
            movie_id: "m1".into(),
            position: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert!(json["position"].is_null());
    }
}

// =============================================================================
// Exit Code Tests
// =============================================================================

mod exit_codes {
    use moviestream::api::CatalogError;
    use moviestream::cli::ExitCode;

    #[test]
    fn test_catalog_errors_map_to_codes() {
        let cases = [
            (CatalogError::Server(502), ExitCode::NetworkError),
            (CatalogError::NotFound, ExitCode::NotFound),
            (
                CatalogError::Auth {
                    status: 401,
                    message: "Not logged in".into(),
                },
                ExitCode::AuthFailed,
            ),
            (
                CatalogError::Validation("Genre already exists".into()),
                ExitCode::ValidationFailed,
            ),
            (CatalogError::InvalidResponse("eof".into()), ExitCode::Error),
        ];
        for (err, code) in cases {
            assert_eq!(ExitCode::from(&err), code, "{}", err);
        }
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(i32::from(ExitCode::NotFound), 4);
        assert_eq!(i32::from(ExitCode::AuthFailed), 5);
        assert_eq!(i32::from(ExitCode::ValidationFailed), 6);
    }
}

// =============================================================================
// Command Handler Tests
// =============================================================================

mod command_handlers {
    use std::path::Path;

    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use moviestream::cli::{
        AdminAction, AdminCmd, Command, ExitCode, GenresCmd, HistoryCmd, InfoCmd,
        MovieUpdateArgs, MoviesCmd, Output, ProgressCmd,
    };
    use moviestream::commands::{self, Context};
    use moviestream::config::Config;

    const MOVIE: &str = r#"{
        "id": "m1",
        "title": "Quiet Harbor",
        "synopsis": "A lighthouse keeper.",
        "genres": ["Drama"],
        "releaseYear": 2019,
        "runtime": 104,
        "posterUrl": "",
        "videoUrl": "https://video.example/m1.mp4",
        "viewCount": 12
    }"#;

    fn context(url: &str, storage: &Path) -> Context {
        Context::new(Config {
            api_url: url.to_string(),
            retry_backoff_ms: 1,
            storage_path: Some(storage.to_path_buf()),
            ..Config::default()
        })
    }

    fn quiet_json() -> Output {
        Output {
            json: true,
            quiet: true,
        }
    }

    async fn logged_in(server: &mut Server, ctx: &Context) {
        server
            .mock("POST", "/api/admin/validate-token")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"valid": true}"#)
            .create_async()
            .await;
        let login = Command::Admin(AdminCmd {
            action: AdminAction::Login {
                token: "secret".into(),
            },
        });
        assert_eq!(
            commands::run(login, ctx, &quiet_json()).await,
            ExitCode::Success
        );
    }

    #[tokio::test]
    async fn test_movies_passes_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/movies")
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_body(format!("[{}]", MOVIE))
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server.url(), &dir.path().join("store.json"));

        let code = commands::run(Command::Movies(MoviesCmd { limit: 5 }), &ctx, &quiet_json()).await;
        assert_eq!(code, ExitCode::Success);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_info_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/movies/missing")
            .with_status(404)
            .with_body(r#"{"detail": "Movie not found"}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server.url(), &dir.path().join("store.json"));

        let code = commands::run(
            Command::Info(InfoCmd {
                id: "missing".into(),
            }),
            &ctx,
            &quiet_json(),
        )
        .await;
        assert_eq!(code, ExitCode::NotFound);
    }

    #[tokio::test]
    async fn test_backend_down_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context("http://127.0.0.1:9", &dir.path().join("store.json"));

        let code = commands::run(Command::Genres(GenresCmd {}), &ctx, &quiet_json()).await;
        assert_eq!(code, ExitCode::NetworkError);
    }

    #[tokio::test]
    async fn test_progress_clear() {
        let server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server.url(), &dir.path().join("store.json"));
        ctx.open_store().save_progress("m1", 42.0).unwrap();

        let code = commands::run(
            Command::Progress(ProgressCmd {
                id: "m1".into(),
                clear: true,
            }),
            &ctx,
            &quiet_json(),
        )
        .await;
        assert_eq!(code, ExitCode::Success);
        assert_eq!(ctx.open_store().progress("m1"), None);
    }

    #[tokio::test]
    async fn test_history_reads_store() {
        let server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server.url(), &dir.path().join("store.json"));
        {
            let mut store = ctx.open_store();
            store
                .record_history("m1", Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap())
                .unwrap();
            store
                .record_history("m2", Utc.with_ymd_and_hms(2024, 3, 2, 20, 0, 0).unwrap())
                .unwrap();
        }

        let code = commands::run(
            Command::History(HistoryCmd { limit: Some(1) }),
            &ctx,
            &quiet_json(),
        )
        .await;
        assert_eq!(code, ExitCode::Success);
        assert_eq!(ctx.open_store().history()[0].movie_id, "m2");
    }

    #[tokio::test]
    async fn test_admin_logout_forgets_token() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server.url(), &dir.path().join("store.json"));
        logged_in(&mut server, &ctx).await;
        assert_eq!(ctx.open_store().admin_token().as_deref(), Some("secret"));

        let logout = Command::Admin(AdminCmd {
            action: AdminAction::Logout,
        });
        assert_eq!(
            commands::run(logout, &ctx, &quiet_json()).await,
            ExitCode::Success
        );
        assert_eq!(ctx.open_store().admin_token(), None);
    }

    #[tokio::test]
    async fn test_admin_genre_add_rejects_unsluggable_name() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server.url(), &dir.path().join("store.json"));
        logged_in(&mut server, &ctx).await;
        let create = server
            .mock("POST", "/api/admin/genres")
            .expect(0)
            .create_async()
            .await;

        let code = commands::run(
            Command::Admin(AdminCmd {
                action: AdminAction::GenreAdd {
                    name: "!!!".into(),
                    slug: None,
                },
            }),
            &ctx,
            &quiet_json(),
        )
        .await;
        assert_eq!(code, ExitCode::ValidationFailed);
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_admin_empty_movie_update_is_rejected() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server.url(), &dir.path().join("store.json"));
        logged_in(&mut server, &ctx).await;

        let update = MovieUpdateArgs {
            id: "m1".into(),
            title: None,
            synopsis: None,
            genres: None,
            cast: None,
            year: None,
            runtime: None,
            poster: None,
            video: None,
            language: None,
            subtitles: None,
        };
        let code = commands::run(
            Command::Admin(AdminCmd {
                action: AdminAction::MovieUpdate(update),
            }),
            &ctx,
            &quiet_json(),
        )
        .await;
        assert_eq!(code, ExitCode::ValidationFailed);
    }
}
