use kino_dal::movie::Movie;
use kino_e2e_tests::{extend_url, launch_server, test_config};
use serde_json::json;
use tracing::info;
use tracing_test::traced_test;

fn inception() -> serde_json::Value {
    json!({
        "title": "Inception",
        "director": "Christopher Nolan",
        "screenwriter": "Christopher Nolan",
        "cast": "Leonardo DiCaprio, Joseph Gordon-Levitt, Elliot Page",
        "genre": "Sci-Fi/Action",
        "release_date": "2010-07-16",
        "runtime": 148,
        "plot_summary": "A thief who steals corporate secrets through dream-sharing technology.",
        "rating": 8.8,
        "country": "USA/UK"
    })
}

#[tokio::test]
#[traced_test]
async fn test_movie_crud() {
    let (args, _config_guard) = test_config("movie-crud").unwrap();
    let (client, base_url, _server_guard) = launch_server(args).await.unwrap();
    let api_url = base_url.join("api/movie").unwrap();

    let response = client
        .post(api_url.clone())
        .json(&inception())
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 201);
    let created: Movie = response.json().await.unwrap();
    assert_eq!(created.title, "Inception");
    assert_eq!(created.runtime, 148);
    assert_eq!(created.rating, Some(8.8));
    // defaults filled by the store
    assert_eq!(created.language, "English");
    assert!(created.is_public);
    assert_eq!(created.created_at, created.updated_at);

    let record_url = extend_url(&api_url, created.id);
    let response = client.get(record_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let fetched: Movie = response.json().await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.director, "Christopher Nolan");

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let mut update = inception();
    update["title"] = json!("Inception (Director's Cut)");
    update["rating"] = json!(9.0);
    update["language"] = json!("French");
    update["is_public"] = json!(false);
    let response = client
        .put(record_url.clone())
        .json(&update)
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert!(response.status().is_success());
    let updated: Movie = response.json().await.unwrap();
    assert_eq!(updated.title, "Inception (Director's Cut)");
    assert_eq!(updated.rating, Some(9.0));
    assert_eq!(updated.language, "French");
    assert!(!updated.is_public);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > updated.created_at);

    let response = client.delete(record_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client.get(record_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client.delete(record_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_movie_validation() {
    let (args, _config_guard) = test_config("movie-validation").unwrap();
    let (client, base_url, _server_guard) = launch_server(args).await.unwrap();
    let api_url = base_url.join("api/movie").unwrap();

    let mut payload = inception();
    payload["rating"] = json!(10.1);
    let response = client
        .post(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    let mut payload = inception();
    payload["rating"] = json!(-0.1);
    let response = client
        .post(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    let mut payload = inception();
    payload["runtime"] = json!(-5);
    let response = client
        .post(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    let mut payload = inception();
    payload["title"] = json!("");
    let response = client
        .post(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    // nothing was stored
    let count_url = extend_url(&api_url, "count");
    let response = client.get(count_url).send().await.unwrap();
    assert!(response.status().is_success());
    let count: u64 = response.json().await.unwrap();
    assert_eq!(count, 0);

    // an invalid update must not touch the existing record either
    let response = client
        .post(api_url.clone())
        .json(&inception())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let created: Movie = response.json().await.unwrap();

    let record_url = extend_url(&api_url, created.id);
    let mut bad_update = inception();
    bad_update["rating"] = json!(8.75);
    let response = client
        .put(record_url.clone())
        .json(&bad_update)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    let response = client.get(record_url).send().await.unwrap();
    let unchanged: Movie = response.json().await.unwrap();
    assert_eq!(unchanged.rating, Some(8.8));

    // missing record
    let missing_url = extend_url(&api_url, 4242);
    let response = client.get(missing_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let response = client
        .put(missing_url)
        .json(&inception())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_movie_listing() {
    let (args, _config_guard) = test_config("movie-listing").unwrap();
    let (client, base_url, _server_guard) = launch_server(args).await.unwrap();
    let api_url = base_url.join("api/movie").unwrap();

    let movies = [
        ("Inception", "Christopher Nolan", "Sci-Fi/Action", "2010-07-16", "USA/UK", true),
        ("Interstellar", "Christopher Nolan", "Sci-Fi/Drama", "2014-11-07", "USA", true),
        ("Oldboy", "Park Chan-wook", "Thriller", "2003-11-21", "South Korea", true),
        ("Amelie", "Jean-Pierre Jeunet", "Comedy", "2001-04-25", "France", false),
    ];
    for (title, director, genre, release_date, country, is_public) in movies {
        let payload = json!({
            "title": title,
            "director": director,
            "cast": "Various",
            "genre": genre,
            "release_date": release_date,
            "runtime": 120,
            "plot_summary": "Plot.",
            "country": country,
            "is_public": is_public,
        });
        let response = client
            .post(api_url.clone())
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    let count_url = extend_url(&api_url, "count");
    let response = client.get(count_url).send().await.unwrap();
    let count: u64 = response.json().await.unwrap();
    assert_eq!(count, 4);

    // default order is newest release first
    let response = client.get(api_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], json!(4));
    assert_eq!(page["page"], json!(1));
    assert_eq!(page["total_pages"], json!(1));
    let rows = page["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["title"], json!("Interstellar"));
    assert_eq!(rows[3]["title"], json!("Amelie"));

    // explicit sort and paging
    let mut page_url = api_url.clone();
    page_url.set_query(Some("page=2&page_size=2&sort=title"));
    let response = client.get(page_url).send().await.unwrap();
    assert!(response.status().is_success());
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["page"], json!(2));
    assert_eq!(page["page_size"], json!(2));
    assert_eq!(page["total_pages"], json!(2));
    let rows = page["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["title"], json!("Interstellar"));
    assert_eq!(rows[1]["title"], json!("Oldboy"));

    // descending sort prefix
    let mut sorted_url = api_url.clone();
    sorted_url.set_query(Some("sort=-title&page_size=1"));
    let response = client.get(sorted_url).send().await.unwrap();
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["rows"][0]["title"], json!("Oldboy"));

    // pages are 1-based
    let mut bad_page_url = api_url.clone();
    bad_page_url.set_query(Some("page=0"));
    let response = client.get(bad_page_url).send().await.unwrap();
    assert!(response.status().is_client_error());

    // sorting by an unknown column is rejected
    let mut bad_sort_url = api_url.clone();
    bad_sort_url.set_query(Some("sort=title;DROP"));
    let response = client.get(bad_sort_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // equality filters
    let mut filter_url = api_url.clone();
    filter_url.set_query(Some("genre=Comedy"));
    let response = client.get(filter_url).send().await.unwrap();
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], json!(1));
    assert_eq!(page["rows"][0]["title"], json!("Amelie"));

    let mut filter_url = api_url.clone();
    filter_url.set_query(Some("is_public=false"));
    let response = client.get(filter_url).send().await.unwrap();
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], json!(1));
    assert_eq!(page["rows"][0]["title"], json!("Amelie"));

    // substring search across title, director, cast, genre and country
    let mut search_url = api_url.clone();
    search_url.set_query(Some("search=nolan"));
    let response = client.get(search_url).send().await.unwrap();
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], json!(2));

    let mut search_url = api_url.clone();
    search_url.set_query(Some("search=Korea&genre=Thriller"));
    let response = client.get(search_url).send().await.unwrap();
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], json!(1));
    assert_eq!(page["rows"][0]["title"], json!("Oldboy"));

    // plain listing without the envelope
    let all_url = extend_url(&api_url, "all");
    let response = client.get(all_url).send().await.unwrap();
    assert!(response.status().is_success());
    let rows: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(rows.len(), 4);
}
