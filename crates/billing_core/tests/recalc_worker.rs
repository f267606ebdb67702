use billing_core::db::{open_db, open_db_in_memory};
use billing_core::tasks::{set_comment, set_price, TaskError};
use billing_core::{
    task_channel, CatalogService, Client, ClientRepository, DrainReport, Plan, PlanRepository,
    PlanType, RecalcTask, Service, ServiceRepository, SignalBus, SqliteBillingRepository,
    Subscription, SubscriptionRepository, SubscriptionService, TaskQueue, TaskWorker,
    TotalSumCache,
};
use rusqlite::Connection;
use std::sync::Arc;

fn seed_catalog(conn: &Connection, full_price: u32, discount: u32) -> (i64, Service, Plan) {
    let repo = SqliteBillingRepository::try_new(conn).unwrap();
    let mut client = Client::new("Umbrella", "9 Hill Ave");
    let client_id = repo.create_client(&mut client).unwrap();
    let mut service = Service::new("storage", full_price);
    repo.create_service(&mut service).unwrap();
    let mut plan = Plan::with_discount(PlanType::Discount, discount);
    repo.create_plan(&mut plan).unwrap();
    (client_id, service, plan)
}

#[test]
fn drained_price_task_writes_discounted_price() {
    let conn = open_db_in_memory().unwrap();
    let (client_id, service, plan) = seed_catalog(&conn, 1000, 15);
    let repo = SqliteBillingRepository::try_new(&conn).unwrap();
    let (queue, receiver) = task_channel();
    let cache = Arc::new(TotalSumCache::new());
    let worker = TaskWorker::new(receiver, cache.clone());
    let subscriptions = SubscriptionService::new(repo, queue, SignalBus::new());

    let mut subscription =
        Subscription::new(client_id, service.id().unwrap(), plan.id().unwrap());
    let id = subscriptions.save_subscription(&mut subscription).unwrap();

    let report = worker.drain(&conn).unwrap();
    assert_eq!(
        report,
        DrainReport {
            processed: 1,
            failed: 0
        }
    );
    let stored = repo.get_subscription(id).unwrap().unwrap();
    assert_eq!(stored.price, 850);
    assert_eq!(stored.comment, "");
}

#[test]
fn discount_change_recomputes_price_and_comment_for_every_subscription() {
    let conn = open_db_in_memory().unwrap();
    let (client_id, service, plan) = seed_catalog(&conn, 200, 0);
    let repo = SqliteBillingRepository::try_new(&conn).unwrap();
    let (queue, receiver) = task_channel();
    let worker = TaskWorker::new(receiver, Arc::new(TotalSumCache::new()));
    let subscriptions = SubscriptionService::new(repo, queue.clone(), SignalBus::new());
    let catalog = CatalogService::new(repo, queue);

    let ids: Vec<i64> = (0..2)
        .map(|_| {
            let mut subscription =
                Subscription::new(client_id, service.id().unwrap(), plan.id().unwrap());
            subscriptions.save_subscription(&mut subscription).unwrap()
        })
        .collect();
    worker.drain(&conn).unwrap();

    let mut plan = plan;
    plan.discount_percent = 50;
    catalog.save_plan(&mut plan).unwrap();
    let report = worker.drain(&conn).unwrap();
    assert_eq!(report.processed, 4);
    assert_eq!(report.failed, 0);

    for id in ids {
        let stored = repo.get_subscription(id).unwrap().unwrap();
        assert_eq!(stored.price, 100);
        assert_eq!(stored.comment, "discount plan, 50% off");
    }
}

#[test]
fn price_task_invalidates_cached_total() {
    let conn = open_db_in_memory().unwrap();
    let (client_id, service, plan) = seed_catalog(&conn, 80, 0);
    let repo = SqliteBillingRepository::try_new(&conn).unwrap();
    let mut subscription =
        Subscription::new(client_id, service.id().unwrap(), plan.id().unwrap());
    let id = repo.create_subscription(&mut subscription).unwrap();

    let cache = TotalSumCache::new();
    assert_eq!(cache.total_sum(&repo).unwrap(), 0);

    assert_eq!(set_price(&repo, &cache, id).unwrap(), 80);
    assert_eq!(cache.cached(), None);
    assert_eq!(cache.total_sum(&repo).unwrap(), 80);
}

#[test]
fn tasks_for_deleted_subscriptions_fail_without_stopping_the_worker() {
    let conn = open_db_in_memory().unwrap();
    let (client_id, service, plan) = seed_catalog(&conn, 100, 0);
    let repo = SqliteBillingRepository::try_new(&conn).unwrap();
    let mut subscription =
        Subscription::new(client_id, service.id().unwrap(), plan.id().unwrap());
    let id = repo.create_subscription(&mut subscription).unwrap();

    let (queue, receiver) = task_channel();
    let worker = TaskWorker::new(receiver, Arc::new(TotalSumCache::new()));
    queue.enqueue(RecalcTask::SetComment(404)).unwrap();
    queue.enqueue(RecalcTask::SetPrice(id)).unwrap();

    let report = worker.drain(&conn).unwrap();
    assert_eq!(
        report,
        DrainReport {
            processed: 2,
            failed: 1
        }
    );
    assert_eq!(repo.get_subscription(id).unwrap().unwrap().price, 100);
    assert!(matches!(
        set_comment(&repo, 404),
        Err(TaskError::SubscriptionNotFound(404))
    ));
}

#[test]
fn spawned_worker_processes_queue_until_producers_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("billing.db");
    let conn = open_db(&path).unwrap();
    let (client_id, service, plan) = seed_catalog(&conn, 500, 20);
    let repo = SqliteBillingRepository::try_new(&conn).unwrap();

    let (queue, receiver) = task_channel();
    let handle = TaskWorker::new(receiver, Arc::new(TotalSumCache::new()))
        .spawn(path.clone())
        .unwrap();

    let subscriptions = SubscriptionService::new(repo, queue, SignalBus::new());
    let mut subscription =
        Subscription::new(client_id, service.id().unwrap(), plan.id().unwrap());
    let id = subscriptions.save_subscription(&mut subscription).unwrap();
    drop(subscriptions);

    let report = handle.join().unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(repo.get_subscription(id).unwrap().unwrap().price, 400);
}
