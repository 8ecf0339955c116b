use std::sync::Arc;

use asupersync::runtime::RuntimeBuilder;
use asupersync::{Cx, Outcome};

use relq::prelude::*;
use relq::{FieldTarget, FromColumns, FromValue, MemoryExecutor, SetterTarget, fetch_first};

fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> std::result::Result<T, String> {
    match outcome {
        Outcome::Ok(v) => Ok(v),
        Outcome::Err(e) => Err(format!("unexpected error: {e}")),
        Outcome::Cancelled(r) => Err(format!("cancelled: {r:?}")),
        Outcome::Panicked(p) => Err(format!("panicked: {p:?}")),
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Team {
    id: i64,
    name: String,
}

impl Record for Team {
    fn hydrate(&mut self, column: &str, value: Value) -> bool {
        match column {
            "id" => {
                if let Some(id) = value.as_i64() {
                    self.id = id;
                }
                true
            }
            "name" => {
                if let Some(name) = value.as_str() {
                    self.name = name.to_string();
                }
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct Member {
    id: i64,
    username: Option<String>,
    age: i32,
    team: Rel<Team>,
}

impl Record for Member {
    fn hydrate(&mut self, column: &str, value: Value) -> bool {
        match column {
            "id" => {
                if let Some(id) = value.as_i64() {
                    self.id = id;
                }
                true
            }
            "username" => {
                self.username = value.as_str().map(str::to_string);
                true
            }
            "age" => {
                if let Some(age) = value.as_i64() {
                    self.age = age as i32;
                }
                true
            }
            _ => false,
        }
    }

    fn attach(&mut self, relation: &str, row: &Row) -> Result<bool> {
        if relation == "team" {
            self.team.resolve(Team::from_row(row)?);
            return Ok(true);
        }
        Ok(false)
    }
}

struct Fixture {
    registry: Arc<SchemaRegistry>,
    member: SchemaId,
    team: SchemaId,
    store: MemoryExecutor,
}

impl Fixture {
    fn member_root(&self) -> EntityPath {
        EntityPath::root(self.registry.clone(), self.member, "m")
    }

    fn team_root(&self) -> EntityPath {
        EntityPath::root(self.registry.clone(), self.team, "t")
    }
}

fn fixture() -> Fixture {
    let mut reg = SchemaRegistry::new();
    let member = reg.register(
        "member",
        "id",
        vec![
            FieldDef::new("id", SemanticType::BigInt),
            FieldDef::new("username", SemanticType::Text).nullable(),
            FieldDef::new("age", SemanticType::Int),
            FieldDef::new("team_id", SemanticType::BigInt).nullable(),
        ],
    );
    let team = reg.register(
        "team",
        "id",
        vec![
            FieldDef::new("id", SemanticType::BigInt),
            FieldDef::new("name", SemanticType::Text),
        ],
    );
    reg.relate(member, "team", team, Cardinality::One, "team_id", "id");
    reg.relate(team, "members", member, Cardinality::Many, "id", "team_id");

    let store = MemoryExecutor::new();
    store.insert(team, [("id", Value::BigInt(1)), ("name", Value::from("teamA"))]);
    store.insert(team, [("id", Value::BigInt(2)), ("name", Value::from("teamB"))]);
    for (id, username, age, team_id) in [
        (1, Some("member1"), 10, Some(1)),
        (2, Some("member2"), 20, Some(1)),
        (3, Some("member3"), 30, Some(2)),
        (4, Some("member4"), 40, Some(2)),
    ] {
        store.insert(
            member,
            [
                ("id", Value::BigInt(id)),
                ("username", Value::from(username.map(str::to_string))),
                ("age", Value::Int(age)),
                ("team_id", Value::from(team_id.map(i64::from))),
            ],
        );
    }
    Fixture {
        registry: Arc::new(reg),
        member,
        team,
        store,
    }
}

/// A dynamic search form: blank criteria contribute nothing to the filter.
fn search_members(
    root: &EntityPath,
    username: Option<&str>,
    min_age: Option<i32>,
) -> Result<Option<Predicate>> {
    let username_eq = match username {
        None => None,
        Some(name) => Some(root.field("username")?.eq(name)?),
    };
    let age_goe = match min_age {
        None => None,
        Some(age) => Some(root.field("age")?.goe(age)?),
    };
    Ok(all([username_eq, age_goe]))
}

#[test]
fn blank_search_criteria_are_skipped() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let m = f.member_root();

        // both criteria present
        let plan = QueryBuilder::from(&m)
            .filter_opt(search_members(&m, Some("member1"), Some(5)).expect("search"))
            .build()
            .expect("build");
        let members: Vec<Member> = unwrap_outcome(fetch_all(&cx, &f.store, &plan).await)
            .expect("fetch");
        assert_eq!(members.len(), 1);

        // username blank: only the age bound applies
        let plan = QueryBuilder::from(&m)
            .filter_opt(search_members(&m, None, Some(25)).expect("search"))
            .build()
            .expect("build");
        let members: Vec<Member> = unwrap_outcome(fetch_all(&cx, &f.store, &plan).await)
            .expect("fetch");
        assert_eq!(members.len(), 2);

        // everything blank: unrestricted, not contradictory
        let plan = QueryBuilder::from(&m)
            .filter_opt(search_members(&m, None, None).expect("search"))
            .build()
            .expect("build");
        let members: Vec<Member> = unwrap_outcome(fetch_all(&cx, &f.store, &plan).await)
            .expect("fetch");
        assert_eq!(members.len(), 4);
    });
}

#[test]
fn sort_is_stable_with_nulls_last() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        for (id, username) in [(5, Some("member5")), (6, Some("member6")), (7, None)] {
            f.store.insert(
                f.member,
                [
                    ("id", Value::BigInt(id)),
                    ("username", Value::from(username.map(str::to_string))),
                    ("age", Value::Int(100)),
                    ("team_id", Value::Null),
                ],
            );
        }
        let m = f.member_root();
        let plan = QueryBuilder::from(&m)
            .filter(m.field("age").expect("age").eq(100).expect("eq"))
            .order_by(OrderTerm::desc(m.field("age").expect("age")))
            .order_by(OrderTerm::asc(m.field("username").expect("username")))
            .build()
            .expect("build");

        let members: Vec<Member> = unwrap_outcome(fetch_all(&cx, &f.store, &plan).await)
            .expect("fetch");
        let usernames: Vec<Option<&str>> =
            members.iter().map(|m| m.username.as_deref()).collect();
        assert_eq!(usernames, vec![Some("member5"), Some("member6"), None]);
    });
}

#[test]
fn fetch_join_materializes_and_lazy_stays_unresolved() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let m = f.member_root();
        let team = m.traverse("team").expect("team path");
        let by_name = m
            .field("username")
            .expect("username")
            .eq("member1")
            .expect("eq");

        // lazy: no fetch join, relation stays unresolved
        let plan = QueryBuilder::from(&m).filter(by_name.clone()).build().expect("build");
        let member: Member = unwrap_outcome(fetch_one(&cx, &f.store, &plan).await)
            .expect("fetch one");
        assert!(!member.team.is_resolved());

        // fetch join: relation is materialized in the same pass
        let plan = QueryBuilder::from(&m)
            .left_join_fetch(&team)
            .filter(by_name)
            .build()
            .expect("build");
        let member: Member = unwrap_outcome(fetch_one(&cx, &f.store, &plan).await)
            .expect("fetch one");
        let loaded = member.team.get().expect("team resolved");
        assert_eq!(loaded.name, "teamA");
    });
}

#[test]
fn left_fetch_join_without_match_stays_unresolved() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        f.store.insert(
            f.member,
            [
                ("id", Value::BigInt(9)),
                ("username", Value::from("drifter")),
                ("age", Value::Int(60)),
                ("team_id", Value::Null),
            ],
        );
        let m = f.member_root();
        let team = m.traverse("team").expect("team path");
        let plan = QueryBuilder::from(&m)
            .left_join_fetch(&team)
            .filter(m.field("username").expect("username").eq("drifter").expect("eq"))
            .build()
            .expect("build");
        let member: Member = unwrap_outcome(fetch_one(&cx, &f.store, &plan).await)
            .expect("fetch one");
        assert!(!member.team.is_resolved());
    });
}

#[test]
fn single_result_failures_are_distinct() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let m = f.member_root();

        let none = QueryBuilder::from(&m)
            .filter(m.field("age").expect("age").eq(999).expect("eq"))
            .build()
            .expect("build");
        match fetch_one::<Member, _>(&cx, &f.store, &none).await {
            Outcome::Err(Error::NoRowFound) => {}
            other => panic!("expected NoRowFound, got {other:?}"),
        }

        let many = QueryBuilder::from(&m)
            .filter(m.field("age").expect("age").goe(10).expect("goe"))
            .build()
            .expect("build");
        match fetch_one::<Member, _>(&cx, &f.store, &many).await {
            Outcome::Err(Error::MultipleRowsFound { count: 4 }) => {}
            other => panic!("expected MultipleRowsFound, got {other:?}"),
        }

        // first is the forgiving variant
        let first: Option<Member> =
            unwrap_outcome(fetch_first(&cx, &f.store, &none).await).expect("fetch first");
        assert!(first.is_none());
    });
}

#[test]
fn theta_join_pairs_unrelated_entities() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        f.store.insert(
            f.member,
            [
                ("id", Value::BigInt(8)),
                ("username", Value::from("teamB")),
                ("age", Value::Int(70)),
                ("team_id", Value::Null),
            ],
        );
        let m = f.member_root();
        let t = f.team_root();
        let plan = QueryBuilder::from(&m)
            .select([m.field("username").expect("username")])
            .cross_join(&t)
            .filter(
                m.field("username")
                    .expect("username")
                    .eq(t.field("name").expect("name"))
                    .expect("eq"),
            )
            .build()
            .expect("build");
        let rows = unwrap_outcome(relq::fetch_rows(&cx, &f.store, &plan).await).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values()[0].as_str(), Some("teamB"));
    });
}

#[test]
fn grouped_averages_per_team() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let m = f.member_root();
        let team_name = m.traverse("team").expect("team").field("name").expect("name");
        let plan = QueryBuilder::from(&m)
            .select([
                team_name.clone().alias("team"),
                m.field("age").expect("age").avg().expect("avg").alias("avg_age"),
            ])
            .group_by([team_name.clone()])
            .order_by(OrderTerm::asc(team_name))
            .build()
            .expect("build");

        let rows: Vec<(String, f64)> = unwrap_outcome(
            project_all(&cx, &f.store, &plan, &Projection::constructor()).await,
        )
        .expect("project");
        assert_eq!(rows, vec![("teamA".to_string(), 15.0), ("teamB".to_string(), 35.0)]);
    });
}

#[derive(Debug, Default, PartialEq)]
struct MemberDto {
    username: Option<String>,
    age: i32,
}

impl FromColumns for MemberDto {
    fn arity() -> usize {
        2
    }

    fn from_columns(values: &[Value]) -> Result<Self> {
        Ok(Self {
            username: Option::<String>::from_value(&values[0])?,
            age: i32::from_value(&values[1])?,
        })
    }
}

impl relq::FieldTarget for MemberDto {
    fn assign(&mut self, column: &str, value: Value) -> bool {
        match column {
            "username" => {
                self.username = value.as_str().map(str::to_string);
                true
            }
            "age" => {
                if let Some(age) = value.as_i64() {
                    self.age = age as i32;
                }
                true
            }
            _ => false,
        }
    }
}

impl SetterTarget for MemberDto {
    fn set(&mut self, column: &str, value: Value) -> Result<bool> {
        Ok(self.assign(column, value))
    }
}

#[test]
fn projection_strategies_agree() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let m = f.member_root();
        let plan = QueryBuilder::from(&m)
            .select([
                m.field("username").expect("username").alias("username"),
                m.field("age").expect("age").alias("age"),
            ])
            .order_by(OrderTerm::asc(m.field("id").expect("id")))
            .build()
            .expect("build");

        let by_ctor: Vec<MemberDto> = unwrap_outcome(
            project_all(&cx, &f.store, &plan, &Projection::constructor()).await,
        )
        .expect("constructor");
        let by_fields: Vec<MemberDto> = unwrap_outcome(
            project_all(&cx, &f.store, &plan, &Projection::fields()).await,
        )
        .expect("fields");
        let by_setters: Vec<MemberDto> = unwrap_outcome(
            project_all(&cx, &f.store, &plan, &Projection::setters()).await,
        )
        .expect("setters");

        assert_eq!(by_ctor.len(), 4);
        assert_eq!(by_ctor, by_fields);
        assert_eq!(by_fields, by_setters);
        assert_eq!(by_ctor[0].username.as_deref(), Some("member1"));
    });
}

#[test]
fn constructor_arity_mismatch_fails_before_execution() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let m = f.member_root();
        // three columns against a two-argument constructor
        let plan = QueryBuilder::from(&m)
            .select([
                m.field("id").expect("id"),
                m.field("username").expect("username"),
                m.field("age").expect("age"),
            ])
            .build()
            .expect("build");
        match project_all::<MemberDto, _>(&cx, &f.store, &plan, &Projection::constructor()).await
        {
            Outcome::Err(Error::ProjectionArityMismatch { expected: 2, found: 3, .. }) => {}
            other => panic!("expected arity mismatch, got {other:?}"),
        }
    });
}

#[test]
fn scalar_subquery_in_where_and_select() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let m = f.member_root();
        let m2 = EntityPath::root(f.registry.clone(), f.member, "m2");
        let max_age = Expr::subquery(
            QueryBuilder::from(&m2)
                .select([m2.field("age").expect("age").max()])
                .build()
                .expect("build inner"),
        )
        .expect("subquery");

        // where age = (select max(age) from member m2)
        let plan = QueryBuilder::from(&m)
            .filter(m.field("age").expect("age").eq(max_age.clone()).expect("eq"))
            .build()
            .expect("build");
        let members: Vec<Member> =
            unwrap_outcome(fetch_all(&cx, &f.store, &plan).await).expect("fetch");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].username.as_deref(), Some("member4"));

        // the same sub-select in select position
        let plan = QueryBuilder::from(&m)
            .select([
                m.field("username").expect("username").alias("username"),
                max_age.alias("max_age"),
            ])
            .order_by(OrderTerm::asc(m.field("id").expect("id")))
            .build()
            .expect("build");
        let rows: Vec<(Option<String>, i64)> = unwrap_outcome(
            project_all(&cx, &f.store, &plan, &Projection::constructor()).await,
        )
        .expect("project");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], (Some("member1".to_string()), 40));
        assert!(rows.iter().all(|(_, max)| *max == 40));
    });
}

#[test]
fn case_chain_takes_the_first_matching_branch() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let m = f.member_root();
        let age = m.field("age").expect("age");
        // the brackets overlap: ties go to the earlier branch
        let bracket = Case::when(age.clone().between(0, 20).expect("between"))
            .then("0~20")
            .expect("then")
            .when(age.clone().between(0, 30).expect("between"))
            .then("0~30")
            .expect("then")
            .otherwise("others")
            .expect("otherwise");

        let plan = QueryBuilder::from(&m)
            .select([bracket.alias("bracket")])
            .order_by(OrderTerm::asc(m.field("id").expect("id")))
            .build()
            .expect("build");
        let brackets: Vec<(String,)> = unwrap_outcome(
            project_all(&cx, &f.store, &plan, &Projection::constructor()).await,
        )
        .expect("project");
        let brackets: Vec<&str> = brackets.iter().map(|(b,)| b.as_str()).collect();
        assert_eq!(brackets, vec!["0~20", "0~20", "0~30", "others"]);
    });
}

#[test]
fn specifications_compose_across_queries() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let f = fixture();
        let adult = Specification::must(|root: &EntityPath| root.field("age")?.goe(18));
        let on_team_a = Specification::must(|root: &EntityPath| {
            root.traverse("team")?.field("name")?.eq("teamA")
        });

        let m = f.member_root();
        let plan = QueryBuilder::from(&m)
            .filter_spec(&adult.clone().and(on_team_a))
            .build()
            .expect("build");
        let members: Vec<Member> =
            unwrap_outcome(fetch_all(&cx, &f.store, &plan).await).expect("fetch");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].username.as_deref(), Some("member2"));

        // the same rule applies unchanged to another query
        let plan = QueryBuilder::from(&m).filter_spec(&adult).build().expect("build");
        let members: Vec<Member> =
            unwrap_outcome(fetch_all(&cx, &f.store, &plan).await).expect("fetch");
        assert_eq!(members.len(), 3);
    });
}
