use driftwatch::{Difference, DriftEngine, DriftType, EngineConfig, Severity};
use serde_json::{Value, json};

fn engine() -> DriftEngine {
    DriftEngine::new(EngineConfig::default())
}

fn managed(resource_type: &str, name: &str, attributes: Value) -> Value {
    json!({
        "mode": "managed",
        "type": resource_type,
        "name": name,
        "instances": [{"attributes": attributes}]
    })
}

fn state(resources: Vec<Value>) -> Value {
    json!({
        "version": 4,
        "terraform_version": "1.9.0",
        "serial": 42,
        "lineage": "3f1c0d2e",
        "resources": resources
    })
}

#[test]
fn test_instance_class_change_yields_single_configuration_item() {
    let state = state(vec![managed(
        "aws_instance",
        "web",
        json!({"id": "i-0abc", "instance_type": "t3.medium", "tags": {"Name": "web"}}),
    )]);
    let snapshot = json!({"us-east-1": {"ec2_instances": [{
        "InstanceId": "i-0abc",
        "InstanceType": "t3.large",
        "Tags": [{"Key": "Name", "Value": "web"}]
    }]}});

    let report = engine().detect_drift(&state, &snapshot).unwrap();

    assert_eq!(report.items.len(), 1);
    let item = &report.items[0];
    assert_eq!(item.drift_type, DriftType::Configuration);
    assert_eq!(item.differences.len(), 1);
    match item.differences.get("instance_type").unwrap() {
        Difference::Value(diff) => {
            assert_eq!(diff.declared, json!("t3.medium"));
            assert_eq!(diff.live, json!("t3.large"));
        }
        other => panic!("expected value difference, got {:?}", other),
    }
}

#[test]
fn test_added_ingress_rule_yields_configuration_item() {
    let state = state(vec![managed(
        "aws_security_group",
        "web",
        json!({
            "id": "sg-1",
            "name": "web",
            "description": "web tier",
            "ingress": [
                {"protocol": "tcp", "from_port": 80, "to_port": 80,
                 "cidr_blocks": ["0.0.0.0/0"]},
                {"protocol": "tcp", "from_port": 443, "to_port": 443,
                 "cidr_blocks": ["0.0.0.0/0"]}
            ]
        }),
    )]);
    let snapshot = json!({"us-east-1": {"security_groups": [{
        "GroupId": "sg-1",
        "GroupName": "web",
        "Description": "web tier",
        "IpPermissions": [
            {"IpProtocol": "tcp", "FromPort": 80, "ToPort": 80,
             "IpRanges": [{"CidrIp": "0.0.0.0/0"}]},
            {"IpProtocol": "tcp", "FromPort": 443, "ToPort": 443,
             "IpRanges": [{"CidrIp": "0.0.0.0/0"}]},
            {"IpProtocol": "tcp", "FromPort": 22, "ToPort": 22,
             "IpRanges": [{"CidrIp": "10.0.0.0/8"}]}
        ]
    }]}});

    let report = engine().detect_drift(&state, &snapshot).unwrap();

    assert_eq!(report.items.len(), 1);
    let item = &report.items[0];
    assert_eq!(item.drift_type, DriftType::Configuration);
    match item.differences.get("ingress_rules").unwrap() {
        Difference::Rules(diff) => {
            assert_eq!(diff.declared.len(), 2);
            assert_eq!(diff.live.len(), 3);
            assert!(diff.impact.contains("added"));
        }
        other => panic!("expected rules difference, got {:?}", other),
    }
}

#[test]
fn test_permuted_rules_produce_no_drift() {
    let state = state(vec![managed(
        "aws_security_group",
        "web",
        json!({
            "id": "sg-1",
            "name": "web",
            "ingress": [
                {"protocol": "tcp", "from_port": 443, "to_port": 443,
                 "cidr_blocks": ["0.0.0.0/0"]},
                {"protocol": "tcp", "from_port": 80, "to_port": 80,
                 "cidr_blocks": ["0.0.0.0/0"]}
            ]
        }),
    )]);
    let snapshot = json!({"us-east-1": {"security_groups": [{
        "GroupId": "sg-1",
        "GroupName": "web",
        "IpPermissions": [
            {"IpProtocol": "tcp", "FromPort": 80, "ToPort": 80,
             "IpRanges": [{"CidrIp": "0.0.0.0/0"}]},
            {"IpProtocol": "tcp", "FromPort": 443, "ToPort": 443,
             "IpRanges": [{"CidrIp": "0.0.0.0/0"}]}
        ]
    }]}});

    let report = engine().detect_drift(&state, &snapshot).unwrap();
    assert!(report.is_clean(), "unexpected drift: {:?}", report.items);
}

#[test]
fn test_missing_bucket_tag_yields_tags_item() {
    let state = state(vec![managed(
        "aws_s3_bucket",
        "data",
        json!({
            "bucket": "corp-data",
            "tags": {"Name": "corp-data", "BackupRetention": "30-days"}
        }),
    )]);
    let snapshot = json!({"us-east-1": {"s3_buckets": [{
        "Name": "corp-data",
        "Tags": [{"Key": "Name", "Value": "corp-data"}]
    }]}});

    let report = engine().detect_drift(&state, &snapshot).unwrap();

    assert_eq!(report.items.len(), 1);
    let item = &report.items[0];
    assert_eq!(item.drift_type, DriftType::Tags);
    assert_eq!(item.severity, Severity::Medium);
    match item.differences.get("tags").unwrap() {
        Difference::Tags(diff) => {
            assert_eq!(
                diff.missing_in_live.get("BackupRetention"),
                Some(&json!("30-days"))
            );
        }
        other => panic!("expected tag difference, got {:?}", other),
    }
}

#[test]
fn test_clean_multi_resource_scan() {
    let state = state(vec![
        managed(
            "aws_instance",
            "web",
            json!({
                "id": "i-1",
                "instance_type": "t3.medium",
                "ami": "ami-123",
                "availability_zone": "us-east-1a",
                "tags": {"Name": "web"}
            }),
        ),
        managed(
            "aws_db_instance",
            "main",
            json!({
                "identifier": "prod-db",
                "instance_class": "db.t3.medium",
                "allocated_storage": 100,
                "tags": {}
            }),
        ),
        managed(
            "aws_iam_role",
            "deploy",
            json!({"name": "deploy-role", "description": "CI deploys", "tags": {}}),
        ),
    ]);
    let snapshot = json!({"us-east-1": {
        "ec2_instances": [{
            "InstanceId": "i-1",
            "InstanceType": "t3.medium",
            "ImageId": "ami-123",
            "Placement": {"AvailabilityZone": "us-east-1a"},
            "Tags": [{"Key": "Name", "Value": "web"}]
        }],
        "rds_instances": [{
            "DBInstanceIdentifier": "prod-db",
            "DBInstanceClass": "db.t3.medium",
            "AllocatedStorage": 100,
            "Tags": []
        }],
        "iam_roles": [{
            "RoleName": "deploy-role",
            "Description": "CI deploys",
            "Tags": []
        }]
    }});

    let report = engine().detect_drift(&state, &snapshot).unwrap();
    assert!(report.is_clean(), "unexpected drift: {:?}", report.items);
    assert!(report.skipped.is_empty());
}

#[test]
fn test_missing_and_extra_detection() {
    let state = state(vec![managed(
        "aws_instance",
        "web",
        json!({"id": "i-declared", "instance_type": "t3.medium"}),
    )]);
    let snapshot = json!({"us-east-1": {"ec2_instances": [{
        "InstanceId": "i-rogue",
        "InstanceType": "t3.micro",
        "State": {"Name": "running"},
        "Tags": [{"Key": "Name", "Value": "experiment"}]
    }]}});

    let report = engine().detect_drift(&state, &snapshot).unwrap();
    assert_eq!(report.items.len(), 2);

    let missing = report
        .items
        .iter()
        .find(|i| i.drift_type == DriftType::Missing)
        .unwrap();
    assert_eq!(missing.terraform_address, "aws_instance.web");
    assert_eq!(missing.live_id, "i-declared");
    assert_eq!(missing.severity, Severity::Critical);

    let extra = report
        .items
        .iter()
        .find(|i| i.drift_type == DriftType::Extra)
        .unwrap();
    assert_eq!(extra.terraform_address, "N/A");
    assert_eq!(extra.live_id, "i-rogue");
    assert_eq!(extra.resource_name, "experiment");
}

#[test]
fn test_ignore_tag_change_is_invisible() {
    let state = state(vec![managed(
        "aws_vpc",
        "main",
        json!({"id": "vpc-1", "tags": {"Name": "main", "CreatedBy": "alice"}}),
    )]);
    let snapshot = json!({"us-east-1": {"vpcs": [{
        "VpcId": "vpc-1",
        "Tags": [
            {"Key": "Name", "Value": "main"},
            {"Key": "CreatedBy", "Value": "bob"}
        ]
    }]}});

    let report = engine().detect_drift(&state, &snapshot).unwrap();
    assert!(report.is_clean());
}

#[test]
fn test_custom_severity_thresholds_apply() {
    let config: EngineConfig = serde_json::from_str(
        r#"{"severity_thresholds": {
            "CRITICAL": ["configuration"],
            "HIGH": [],
            "MEDIUM": [],
            "LOW": ["missing", "extra", "tags"]
        }}"#,
    )
    .unwrap();
    let state = state(vec![managed(
        "aws_instance",
        "web",
        json!({"id": "i-1", "instance_type": "t3.medium"}),
    )]);
    let snapshot = json!({"us-east-1": {"ec2_instances": [{
        "InstanceId": "i-1",
        "InstanceType": "t3.large"
    }]}});

    let report = DriftEngine::new(config).detect_drift(&state, &snapshot).unwrap();
    assert_eq!(report.items[0].severity, Severity::Critical);
}

#[test]
fn test_multi_region_items_carry_region() {
    let state = state(vec![managed(
        "aws_instance",
        "web",
        json!({"id": "i-1", "instance_type": "t3.medium"}),
    )]);
    // Declared once; live only in us-east-1, so eu-west-1 reports it missing.
    let snapshot = json!({
        "region": "us-east-1",
        "us-east-1": {"ec2_instances": [{
            "InstanceId": "i-1", "InstanceType": "t3.medium"
        }]},
        "eu-west-1": {"ec2_instances": []}
    });

    let report = engine().detect_drift(&state, &snapshot).unwrap();
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].drift_type, DriftType::Missing);
    assert_eq!(report.items[0].region, "eu-west-1");
}

#[test]
fn test_state_parse_failure_is_fatal() {
    let report = engine().detect_drift(&json!("not a state"), &json!({}));
    assert!(report.is_err());
}

#[test]
fn test_drift_items_serialize_for_downstream_collaborators() {
    let state = state(vec![managed(
        "aws_instance",
        "web",
        json!({"id": "i-1", "instance_type": "t3.medium"}),
    )]);
    let snapshot = json!({"us-east-1": {"ec2_instances": [{
        "InstanceId": "i-1", "InstanceType": "t3.large"
    }]}});

    let report = engine().detect_drift(&state, &snapshot).unwrap();
    let serialized = serde_json::to_value(&report).unwrap();
    let item = &serialized["items"][0];
    assert_eq!(item["resource_type"], "aws_instance");
    assert_eq!(item["terraform_address"], "aws_instance.web");
    assert_eq!(item["live_id"], "i-1");
    assert_eq!(item["drift_type"], "configuration");
    assert_eq!(item["severity"], "HIGH");
    assert_eq!(item["environment"], "production");
    assert!(item["first_detected"].is_string());
    assert_eq!(
        item["differences"]["instance_type"]["declared"],
        "t3.medium"
    );
}
