use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use certificate_generator::models::{
    CertificateFilter, CertificateType, CustomText, ElementId, EventParticipant, LabelKey, LayoutConfig,
    NewCertificate, NewPreset, Position, Recipient, TemplateId, User,
};
use certificate_generator::preparation::{IssueRequest, IssueService, IssueSettings};
use certificate_generator::storage::{DataService, InMemoryDataService};

fn recipient(id: &str, name: &str, rank: u32) -> Recipient {
    Recipient::from_user(User {
        id: id.into(),
        full_name: Some(name.into()),
        username: None,
        class_name: Some("12A3".into()),
        points: Some(120),
    })
    .with_rank(rank)
}

fn request(config: LayoutConfig) -> IssueRequest {
    IssueRequest {
        event_id: Some("olympic-2024".into()),
        title: "Chứng nhận {full_name} hạng {rank}".into(),
        certificate_type: CertificateType::Excellent,
        template_id: TemplateId::Custom,
        issue_date: NaiveDate::from_ymd_opt(2024, 11, 20).unwrap(),
        recipients: vec![recipient("u1", "Nguyễn Văn A", 1), recipient("u2", "Trần Thị B", 2)],
        config,
        preset_name: Some("Olympic 2024".into()),
    }
}

#[tokio::test]
async fn titles_are_personalized_per_recipient() {
    let store = Arc::new(InMemoryDataService::new());
    let service = IssueService::new(store, IssueSettings::default());

    let outcome = service.issue(request(LayoutConfig::default())).await.unwrap();
    let titles: Vec<&str> = outcome.certificates.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Chứng nhận Nguyễn Văn A hạng 1", "Chứng nhận Trần Thị B hạng 2"]);
    assert_ne!(
        outcome.certificates[0].verification_code,
        outcome.certificates[1].verification_code
    );
    assert_eq!(outcome.preset.unwrap().name, "Olympic 2024");
}

#[tokio::test]
async fn stored_metadata_survives_later_edits() {
    let store = Arc::new(InMemoryDataService::new());
    let service = IssueService::new(store.clone(), IssueSettings::default());

    let mut live = LayoutConfig::default();
    live.positions.insert(ElementId::Recipient, Position::new(40.0, 45.0));
    live.labels.set(LabelKey::Signature, "Hiệu trưởng");
    let issued = service.issue(request(live.clone())).await.unwrap();
    let preset_id = issued.preset.as_ref().unwrap().id;

    // Keep editing the live layout and replace the preset
    live.positions.insert(ElementId::Recipient, Position::new(10.0, 10.0));
    live.labels.set(LabelKey::Signature, "Phó hiệu trưởng");
    store
        .save_preset(NewPreset {
            name: "Olympic 2024 v2".into(),
            template_id: TemplateId::Custom,
            config: live.clone(),
            auto_saved: false,
        })
        .await
        .unwrap();
    store.delete_preset(preset_id).await.unwrap();

    let stored = store
        .fetch_certificates(&CertificateFilter::for_event("olympic-2024"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    for certificate in stored {
        let metadata = certificate.metadata.unwrap();
        assert_eq!(metadata.position(&ElementId::Recipient), Position::new(40.0, 45.0));
        assert_eq!(metadata.labels.get(LabelKey::Signature), Some("Hiệu trưởng"));
    }
}

#[tokio::test]
async fn stored_exports_rebuild_jobs_from_snapshots() {
    let store = Arc::new(InMemoryDataService::new());
    store
        .insert_user(User {
            id: "u1".into(),
            full_name: Some("Nguyễn Văn A".into()),
            username: None,
            class_name: None,
            points: None,
        })
        .await;
    let service = IssueService::new(store, IssueSettings::default());

    let mut live = LayoutConfig::default();
    live.visibility.insert(ElementId::Qr, true);
    service.issue(request(live)).await.unwrap();

    let jobs = service
        .stored_jobs(&CertificateFilter {
            recipient_id: Some("u1".into()),
            event_id: Some("olympic-2024".into()),
        })
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].recipient_name, "Nguyễn Văn A");
    assert_eq!(jobs[0].template_id, TemplateId::Custom);
    assert!(jobs[0]
        .config
        .as_ref()
        .unwrap()
        .is_visible(TemplateId::Custom, &ElementId::Qr));

    // The name is kept from issue time even without a user record
    let jobs = service
        .stored_jobs(&CertificateFilter {
            recipient_id: Some("u2".into()),
            event_id: None,
        })
        .await
        .unwrap();
    assert_eq!(jobs[0].recipient_name, "Trần Thị B");
}

#[tokio::test]
async fn captions_are_personalized_once_at_issue() {
    let store = Arc::new(InMemoryDataService::new());
    let service = IssueService::new(store.clone(), IssueSettings::default());

    let mut live = LayoutConfig::default();
    live.labels.set(LabelKey::PresentedTo, "Giải {rank} - {points} điểm");
    live.custom_texts.push(CustomText {
        id: "motto".into(),
        content: "Chúc mừng {full_name}".into(),
        x: 50.0,
        y: 80.0,
        font_size: 18.0,
        color: None,
        font_style: None,
    });
    let issued = service.issue(request(live)).await.unwrap();

    // The preset keeps the placeholders for the next batch
    let preset = issued.preset.unwrap();
    assert_eq!(preset.config.labels.get(LabelKey::PresentedTo), Some("Giải {rank} - {points} điểm"));

    // Later changes to the user record do not reach issued certificates
    store
        .insert_user(User {
            id: "u1".into(),
            full_name: Some("Nguyễn Văn An".into()),
            username: None,
            class_name: None,
            points: Some(999),
        })
        .await;

    let jobs = service
        .stored_jobs(&CertificateFilter::for_event("olympic-2024"))
        .await
        .unwrap();
    let captions: Vec<(String, String)> = jobs
        .iter()
        .map(|job| {
            let config = job.config.as_ref().unwrap();
            (
                config.labels.get(LabelKey::PresentedTo).unwrap_or_default().to_string(),
                config.custom_texts[0].content.clone(),
            )
        })
        .collect();
    assert_eq!(
        captions,
        vec![
            ("Giải 1 - 120 điểm".to_string(), "Chúc mừng Nguyễn Văn A".to_string()),
            ("Giải 2 - 120 điểm".to_string(), "Chúc mừng Trần Thị B".to_string()),
        ]
    );
    assert_eq!(jobs[0].recipient_name, "Nguyễn Văn A");
    assert_eq!(jobs[0].data.title, "Chứng nhận Nguyễn Văn A hạng 1");
}

#[tokio::test]
async fn guests_keep_their_issued_name() {
    let store = Arc::new(InMemoryDataService::new());
    let service = IssueService::new(store, IssueSettings::default());

    let mut req = request(LayoutConfig::default());
    req.recipients = vec![Recipient::from_participant(EventParticipant {
        id: "p7".into(),
        event_id: "olympic-2024".into(),
        user_id: None,
        full_name: None,
        name: Some("Khách mời".into()),
        class_name: None,
    })];
    let issued = service.issue(req).await.unwrap();
    assert_eq!(issued.certificates[0].recipient_name, "Khách mời");

    let jobs = service
        .stored_jobs(&CertificateFilter {
            recipient_id: Some("p7".into()),
            event_id: None,
        })
        .await
        .unwrap();
    assert_eq!(jobs[0].recipient_name, "Khách mời");
    assert_eq!(jobs[0].data.recipient_name, "Khách mời");
}

#[tokio::test]
async fn unnamed_records_fall_back_to_lookups() {
    let store = Arc::new(InMemoryDataService::new());
    store
        .insert_participant(EventParticipant {
            id: "p9".into(),
            event_id: "olympic-2024".into(),
            user_id: None,
            full_name: Some("Lê Văn C".into()),
            name: None,
            class_name: None,
        })
        .await;
    let legacy = |id: &str| NewCertificate {
        id: Uuid::new_v4(),
        recipient_id: id.into(),
        recipient_name: String::new(),
        event_id: Some("olympic-2024".into()),
        certificate_type: CertificateType::Participation,
        title: "Giấy chứng nhận".into(),
        template_id: TemplateId::Classic,
        issue_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
        verification_code: "OLD00001".into(),
        metadata: LayoutConfig::default(),
    };
    store.create_certificates(vec![legacy("p9"), legacy("gone")]).await.unwrap();

    let service = IssueService::new(store, IssueSettings::default());
    let jobs = service
        .stored_jobs(&CertificateFilter::for_event("olympic-2024"))
        .await
        .unwrap();
    let names: Vec<&str> = jobs.iter().map(|job| job.recipient_name.as_str()).collect();
    assert_eq!(names, vec!["Lê Văn C", "(unknown)"]);
}
